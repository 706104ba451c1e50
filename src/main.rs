use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use calhub::app::build_app;
use calhub::config::AppConfig;
use calhub::db;
use calhub::services::catalog::ProviderCatalog;
use calhub::services::session::HmacSessionProvider;
use calhub::services::telemetry::{HttpTelemetrySink, NoopTelemetry, TelemetrySink};
use calhub::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    if config.session_secret == "changeme" {
        tracing::warn!("SESSION_SECRET is not set, using the insecure default");
    }

    let conn = db::init_db(&config.database_url)?;

    let telemetry: Arc<dyn TelemetrySink> = if config.telemetry_url.is_empty() {
        tracing::info!("telemetry disabled");
        Arc::new(NoopTelemetry)
    } else {
        tracing::info!("sending page views to {}", config.telemetry_url);
        Arc::new(HttpTelemetrySink::new(config.telemetry_url.clone()))
    };

    let catalog = ProviderCatalog::from_env();
    for entry in catalog.entries().iter().filter(|e| !e.installed) {
        tracing::info!(provider = entry.provider_type, "provider not installed");
    }

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        sessions: Box::new(HmacSessionProvider::new(
            config.session_secret.clone(),
            config.session_ttl_minutes,
        )),
        config: config.clone(),
        catalog,
        telemetry,
    });

    let app = build_app(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
