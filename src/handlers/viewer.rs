use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::response::Redirect;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Integrations, ViewerRecord};
use crate::services::connections::{self, ConnectStart, Refresh};
use crate::services::integrations::fetch_integrations;
use crate::services::session::Session;
use crate::services::viewer::load_viewer;
use crate::state::AppState;

use super::current_session;

/// The session behind an API request; rejects with 401 when there is none.
pub struct Viewer(pub Session);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        current_session(state, &parts.headers)
            .await?
            .map(Viewer)
            .ok_or(AppError::Unauthorized)
    }
}

// GET /api/viewer/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    Viewer(session): Viewer,
) -> Result<Json<ViewerRecord>, AppError> {
    let db = state.db()?;
    load_viewer(&db, session.user_id)?
        .map(Json)
        .ok_or(AppError::Unauthorized)
}

// GET /api/viewer/integrations
pub async fn integrations(
    State(state): State<Arc<AppState>>,
    Viewer(session): Viewer,
) -> Result<Json<Integrations>, AppError> {
    let db = state.db()?;
    let integrations = fetch_integrations(&db, &state.catalog, session.user_id)?;
    Ok(Json(integrations))
}

// POST /api/viewer/integrations/connect
#[derive(Deserialize)]
pub struct ConnectRequest {
    #[serde(rename = "type")]
    pub provider_type: String,
}

pub async fn connect(
    State(state): State<Arc<AppState>>,
    Viewer(session): Viewer,
    Json(body): Json<ConnectRequest>,
) -> Result<Json<ConnectStart>, AppError> {
    let db = state.db()?;
    let start = connections::begin_connect(
        &db,
        &state.catalog,
        &state.config.public_url,
        session.user_id,
        &body.provider_type,
    )?;
    Ok(Json(start))
}

// POST /api/viewer/integrations/disconnect
#[derive(Deserialize)]
pub struct DisconnectRequest {
    pub id: i64,
}

#[derive(Serialize)]
pub struct MutationResponse {
    ok: bool,
    #[serde(flatten)]
    refresh: Refresh,
}

pub async fn disconnect(
    State(state): State<Arc<AppState>>,
    Viewer(session): Viewer,
    Json(body): Json<DisconnectRequest>,
) -> Result<Json<MutationResponse>, AppError> {
    let db = state.db()?;
    let refresh = connections::disconnect(&db, &state.catalog, session.user_id, body.id)?;
    Ok(Json(MutationResponse { ok: true, refresh }))
}

// GET /api/integrations/:provider/callback?code=...
#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

pub async fn connect_callback(
    State(state): State<Arc<AppState>>,
    Viewer(session): Viewer,
    Path(provider_type): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, AppError> {
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::InvalidAction("missing authorization code".to_string()))?;

    let db = state.db()?;
    connections::complete_connect(&db, &state.catalog, session.user_id, &provider_type, &code)?;
    Ok(Redirect::to("/integrations"))
}
