use std::sync::Arc;

use axum::middleware;
use axum::routing::{any, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build_app(state: Arc<AppState>) -> Router {
    let shell = Router::new()
        .route("/integrations", get(handlers::pages::integrations_page))
        .route("/event-types", get(handlers::pages::shell_page))
        .route("/availability", get(handlers::pages::shell_page))
        .route("/bookings/*rest", get(handlers::pages::shell_page))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            handlers::pages::require_onboarded,
        ));

    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/user/exists",
            any(handlers::user::user_exists).layer(handlers::user::exists_cors()),
        )
        .route("/api/viewer/me", get(handlers::viewer::me))
        .route("/api/viewer/integrations", get(handlers::viewer::integrations))
        .route(
            "/api/viewer/integrations/connect",
            post(handlers::viewer::connect),
        )
        .route(
            "/api/viewer/integrations/disconnect",
            post(handlers::viewer::disconnect),
        )
        .route(
            "/api/integrations/:provider/callback",
            get(handlers::viewer::connect_callback),
        )
        .merge(shell)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
