//! Application-instance side of the shell: typed API access, the per-instance
//! query cache and the drivers that sit on top of it.

pub mod cache;
pub mod panel;
pub mod shell;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{Integrations, ViewerRecord};
use crate::services::connections::{ConnectStart, ConnectionError, Refresh};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("not signed in")]
    Unauthenticated,

    #[error("fetch failed: {0}")]
    Transient(String),

    #[error("action rejected: {0}")]
    Rejected(#[from] ConnectionError),

    #[error("mutation failed: {0}")]
    Mutation(String),
}

#[async_trait]
pub trait ViewerApi: Send + Sync {
    async fn me(&self) -> Result<ViewerRecord, ClientError>;
    async fn integrations(&self) -> Result<Integrations, ClientError>;
    async fn connect(&self, provider_type: &str) -> Result<ConnectStart, ClientError>;
    async fn disconnect(&self, credential_id: i64) -> Result<Refresh, ClientError>;
}

/// `ViewerApi` over the HTTP endpoints, authenticated with a session token.
pub struct HttpViewerApi {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl HttpViewerApi {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let res = self
            .client
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ClientError::Transient(e.to_string()))?;

        if res.status() == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthenticated);
        }
        res.error_for_status()
            .map_err(|e| ClientError::Transient(e.to_string()))?
            .json()
            .await
            .map_err(|e| ClientError::Transient(e.to_string()))
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let res = self
            .client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Mutation(e.to_string()))?;

        if res.status() == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthenticated);
        }
        res.error_for_status()
            .map_err(|e| ClientError::Mutation(e.to_string()))?
            .json()
            .await
            .map_err(|e| ClientError::Mutation(e.to_string()))
    }
}

#[async_trait]
impl ViewerApi for HttpViewerApi {
    async fn me(&self) -> Result<ViewerRecord, ClientError> {
        self.get_json("/api/viewer/me").await
    }

    async fn integrations(&self) -> Result<Integrations, ClientError> {
        self.get_json("/api/viewer/integrations").await
    }

    async fn connect(&self, provider_type: &str) -> Result<ConnectStart, ClientError> {
        self.post_json(
            "/api/viewer/integrations/connect",
            &serde_json::json!({ "type": provider_type }),
        )
        .await
    }

    async fn disconnect(&self, credential_id: i64) -> Result<Refresh, ClientError> {
        self.post_json(
            "/api/viewer/integrations/disconnect",
            &serde_json::json!({ "id": credential_id }),
        )
        .await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::models::Credential;
    use crate::services::catalog::ProviderCatalog;
    use crate::services::integrations::aggregate;

    /// In-memory `ViewerApi` backed by a credential list.
    pub(crate) struct MockApi {
        pub me_failures_left: AtomicU32,
        pub me_calls: AtomicU32,
        pub integrations_calls: AtomicU32,
        pub fail_mutations: AtomicBool,
        pub completed_onboarding: AtomicBool,
        pub credentials: Mutex<Vec<Credential>>,
        pub catalog: ProviderCatalog,
    }

    impl MockApi {
        pub fn new() -> Self {
            Self {
                me_failures_left: AtomicU32::new(0),
                me_calls: AtomicU32::new(0),
                integrations_calls: AtomicU32::new(0),
                fail_mutations: AtomicBool::new(false),
                completed_onboarding: AtomicBool::new(true),
                credentials: Mutex::new(vec![]),
                catalog: ProviderCatalog::all_installed(),
            }
        }

        pub fn with_credential(self, id: i64, provider_type: &str) -> Self {
            self.credentials.lock().unwrap().push(Credential {
                id,
                provider_type: provider_type.to_string(),
                user_id: 1,
                created_at: chrono::Utc::now().naive_utc(),
            });
            self
        }
    }

    #[async_trait]
    impl ViewerApi for MockApi {
        async fn me(&self) -> Result<ViewerRecord, ClientError> {
            self.me_calls.fetch_add(1, Ordering::SeqCst);
            let left = self.me_failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.me_failures_left.store(left - 1, Ordering::SeqCst);
                return Err(ClientError::Transient("flaky".to_string()));
            }
            Ok(ViewerRecord {
                id: 1,
                username: "viewer".to_string(),
                credentials: self.credentials.lock().unwrap().clone(),
                time_zone: "Europe/London".to_string(),
                buffer_time: 0,
                availability: vec![],
                start_time: 0,
                end_time: 1440,
                selected_calendars: vec![],
                completed_onboarding: self.completed_onboarding.load(Ordering::SeqCst),
                created_at: chrono::Utc::now().naive_utc(),
            })
        }

        async fn integrations(&self) -> Result<Integrations, ClientError> {
            self.integrations_calls.fetch_add(1, Ordering::SeqCst);
            Ok(aggregate(&self.catalog, &self.credentials.lock().unwrap()))
        }

        async fn connect(&self, provider_type: &str) -> Result<ConnectStart, ClientError> {
            if self.fail_mutations.load(Ordering::SeqCst) {
                return Err(ClientError::Mutation("server error".to_string()));
            }
            Ok(ConnectStart {
                url: format!("http://test/api/integrations/{provider_type}/callback?code=x"),
                refresh: Refresh::integrations(),
            })
        }

        async fn disconnect(&self, credential_id: i64) -> Result<Refresh, ClientError> {
            if self.fail_mutations.load(Ordering::SeqCst) {
                return Err(ClientError::Mutation("server error".to_string()));
            }
            self.credentials
                .lock()
                .unwrap()
                .retain(|c| c.id != credential_id);
            Ok(Refresh::integrations())
        }
    }
}
