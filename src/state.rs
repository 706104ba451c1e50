use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::services::catalog::ProviderCatalog;
use crate::services::session::SessionProvider;
use crate::services::telemetry::TelemetrySink;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub catalog: ProviderCatalog,
    pub sessions: Box<dyn SessionProvider>,
    pub telemetry: Arc<dyn TelemetrySink>,
}

impl AppState {
    pub fn db(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.db
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("database lock poisoned")))
    }
}
