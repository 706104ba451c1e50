use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::Method;
use axum::Json;
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::errors::AppError;
use crate::services::onboarding;
use crate::state::AppState;

/// Existence checks are called from embeds on other origins.
pub fn exists_cors() -> CorsLayer {
    CorsLayer::new().allow_origin(Any).allow_methods([
        Method::GET,
        Method::HEAD,
        Method::PUT,
        Method::PATCH,
        Method::POST,
        Method::DELETE,
    ])
}

#[derive(Deserialize)]
pub struct ExistsQuery {
    pub user: Option<String>,
}

// ANY /api/user/exists?user=<handle>
pub async fn user_exists(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExistsQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = {
        let db = state.db()?;
        onboarding::check_user_exists(&db, query.user.as_deref())
    };

    if let Err(AppError::UserNotFound) = &result {
        tracing::debug!(user = ?query.user, "existence check missed");
    }
    result?;

    Ok(Json(serde_json::json!({ "message": "User is found" })))
}
