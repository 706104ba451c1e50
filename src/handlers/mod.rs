pub mod health;
pub mod pages;
pub mod user;
pub mod viewer;

use axum::http::HeaderMap;

use crate::errors::AppError;
use crate::services::session::{token_from_headers, Session};
use crate::state::AppState;

pub(crate) async fn current_session(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<Session>, AppError> {
    let Some(token) = token_from_headers(headers) else {
        return Ok(None);
    };
    Ok(state.sessions.resolve(&token).await?)
}
