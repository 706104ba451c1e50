use std::sync::Arc;
use std::time::Duration;

use crate::models::{Integrations, ViewerRecord};
use crate::services::connections::{QueryKey, Refresh};

use super::{ClientError, ViewerApi};

/// Extra attempts made for the identity fetch before giving up.
pub const IDENTITY_RETRIES: u32 = 3;

/// Query cache scoped to one application instance.
pub struct QueryCache {
    api: Arc<dyn ViewerApi>,
    viewer: Option<ViewerRecord>,
    integrations: Option<Integrations>,
    retry_delay: Duration,
}

impl QueryCache {
    pub fn new(api: Arc<dyn ViewerApi>) -> Self {
        Self {
            api,
            viewer: None,
            integrations: None,
            retry_delay: Duration::from_millis(500),
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn api(&self) -> Arc<dyn ViewerApi> {
        Arc::clone(&self.api)
    }

    pub fn is_cached(&self, key: QueryKey) -> bool {
        match key {
            QueryKey::ViewerMe => self.viewer.is_some(),
            QueryKey::ViewerIntegrations => self.integrations.is_some(),
        }
    }

    pub fn cached_integrations(&self) -> Option<&Integrations> {
        self.integrations.as_ref()
    }

    /// `viewer.me`, retried with linear backoff. A missing session is not retried.
    pub async fn viewer(&mut self) -> Result<ViewerRecord, ClientError> {
        if let Some(viewer) = &self.viewer {
            return Ok(viewer.clone());
        }

        let mut attempt = 0;
        let viewer = loop {
            match self.api.me().await {
                Ok(viewer) => break viewer,
                Err(ClientError::Unauthenticated) => return Err(ClientError::Unauthenticated),
                Err(e) if attempt >= IDENTITY_RETRIES => {
                    tracing::warn!(error = %e, attempts = attempt + 1, "viewer fetch gave up");
                    return Err(e);
                }
                Err(e) => {
                    attempt += 1;
                    tracing::debug!(error = %e, attempt, "retrying viewer fetch");
                    tokio::time::sleep(self.retry_delay * attempt).await;
                }
            }
        };

        self.viewer = Some(viewer.clone());
        Ok(viewer)
    }

    /// `viewer.integrations`; failures surface immediately.
    pub async fn integrations(&mut self) -> Result<Integrations, ClientError> {
        if let Some(integrations) = &self.integrations {
            return Ok(integrations.clone());
        }
        let integrations = self.api.integrations().await?;
        self.integrations = Some(integrations.clone());
        Ok(integrations)
    }

    pub fn invalidate(&mut self, key: QueryKey) {
        match key {
            QueryKey::ViewerMe => self.viewer = None,
            QueryKey::ViewerIntegrations => self.integrations = None,
        }
    }

    /// Invalidates every key in `refresh`, then refetches them so the cache is
    /// settled when this returns.
    pub async fn apply(&mut self, refresh: &Refresh) -> Result<(), ClientError> {
        for key in &refresh.invalidate {
            self.invalidate(*key);
        }
        for key in &refresh.invalidate {
            match key {
                QueryKey::ViewerMe => {
                    self.viewer().await?;
                }
                QueryKey::ViewerIntegrations => {
                    self.integrations().await?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::client::testing::MockApi;

    fn cache(api: &Arc<MockApi>) -> QueryCache {
        QueryCache::new(Arc::clone(api) as Arc<dyn ViewerApi>).with_retry_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_viewer_retries_three_times_then_succeeds() {
        let api = Arc::new(MockApi::new());
        api.me_failures_left.store(3, Ordering::SeqCst);
        let mut cache = cache(&api);

        assert!(cache.viewer().await.is_ok());
        assert_eq!(api.me_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_viewer_gives_up_after_retries() {
        let api = Arc::new(MockApi::new());
        api.me_failures_left.store(10, Ordering::SeqCst);
        let mut cache = cache(&api);

        assert!(matches!(cache.viewer().await, Err(ClientError::Transient(_))));
        assert_eq!(api.me_calls.load(Ordering::SeqCst), 1 + IDENTITY_RETRIES);
        assert!(!cache.is_cached(QueryKey::ViewerMe));
    }

    #[tokio::test]
    async fn test_integrations_cached_until_invalidated() {
        let api = Arc::new(MockApi::new().with_credential(1, "zoom_video"));
        let mut cache = cache(&api);

        cache.integrations().await.unwrap();
        cache.integrations().await.unwrap();
        assert_eq!(api.integrations_calls.load(Ordering::SeqCst), 1);

        cache.invalidate(QueryKey::ViewerIntegrations);
        cache.integrations().await.unwrap();
        assert_eq!(api.integrations_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_apply_refetches_before_returning() {
        let api = Arc::new(MockApi::new().with_credential(1, "zoom_video"));
        let mut cache = cache(&api);
        cache.integrations().await.unwrap();

        api.credentials.lock().unwrap().clear();
        cache.apply(&Refresh::integrations()).await.unwrap();

        let fresh = cache.cached_integrations().unwrap();
        assert_eq!(fresh.conferencing.num_active, 0);
    }
}
