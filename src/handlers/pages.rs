use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::gate::{self, GateInput, GateView, ViewerStatus};
use crate::models::{
    Category, ConnectionState, IntegrationDescriptor, PrimaryAction, ViewerRecord,
};
use crate::services::integrations::fetch_integrations;
use crate::services::onboarding::viewer_needs_onboarding;
use crate::services::telemetry::emit_page_view;
use crate::services::viewer::load_viewer;
use crate::state::AppState;

use super::current_session;

/// Runs the access gate in front of every shell page.
pub async fn require_onboarded(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let route = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    emit_page_view(Arc::clone(&state.telemetry), &route);

    let session = match current_session(&state, req.headers()).await {
        Ok(session) => session,
        Err(e) => return e.into_response(),
    };

    let (viewer, viewer_status) = match session {
        None => (None, ViewerStatus::Pending),
        Some(session) => {
            let loaded = state
                .db()
                .and_then(|db| load_viewer(&db, session.user_id).map_err(AppError::from));
            match loaded {
                Ok(Some(viewer)) => {
                    let status = if viewer_needs_onboarding(&viewer, state.config.onboarding_introduced_at) {
                        ViewerStatus::NeedsOnboarding
                    } else {
                        ViewerStatus::Onboarded
                    };
                    (Some(viewer), status)
                }
                // Session for a user that no longer exists.
                Ok(None) => (None, ViewerStatus::Pending),
                Err(e) => {
                    tracing::warn!(error = %e, user_id = session.user_id, "viewer lookup failed");
                    (None, ViewerStatus::Failed)
                }
            }
        }
    };

    let has_session = viewer.is_some() || viewer_status == ViewerStatus::Failed;
    let input = GateInput::resolved(has_session, viewer_status);
    let phase = gate::settle(&input);

    if let Some(target) = gate::redirect_target(phase, &route) {
        tracing::debug!(route = %route, target = %target, "gate redirect");
        return Redirect::temporary(&target).into_response();
    }

    match (gate::view(phase, &input), viewer) {
        (GateView::Content, Some(viewer)) => {
            req.extensions_mut().insert(viewer);
            next.run(req).await
        }
        _ => AppError::Unavailable("viewer could not be loaded, retry".to_string()).into_response(),
    }
}

#[derive(Serialize)]
pub struct ShellPage {
    page: String,
    username: String,
}

// GET /event-types, /availability, /bookings/*
pub async fn shell_page(
    Extension(viewer): Extension<ViewerRecord>,
    uri: axum::http::Uri,
) -> Json<ShellPage> {
    Json(ShellPage {
        page: uri.path().to_string(),
        username: viewer.username,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationRow {
    #[serde(flatten)]
    descriptor: IntegrationDescriptor,
    connection: ConnectionState,
    action: PrimaryAction,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySection {
    name: Category,
    num_active: usize,
    items: Vec<IntegrationRow>,
}

#[derive(Serialize)]
pub struct IntegrationsPage {
    categories: Vec<CategorySection>,
}

// GET /integrations
pub async fn integrations_page(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<ViewerRecord>,
) -> Result<Json<IntegrationsPage>, AppError> {
    let integrations = {
        let db = state.db()?;
        fetch_integrations(&db, &state.catalog, viewer.id)?
    };

    let categories = Category::ALL
        .into_iter()
        .map(|name| {
            let category = integrations.category(name);
            CategorySection {
                name,
                num_active: category.num_active,
                items: category
                    .items
                    .iter()
                    .map(|d| IntegrationRow {
                        connection: d.connection_state(),
                        action: d.primary_action(),
                        descriptor: d.clone(),
                    })
                    .collect(),
            }
        })
        .collect();

    Ok(Json(IntegrationsPage { categories }))
}
