use std::sync::Arc;

use chrono::NaiveDate;

use crate::gate::{Gate, GateInput, GateOutput, LocaleStatus, PendingRedirect, ViewerStatus};
use crate::services::onboarding::viewer_needs_onboarding;
use crate::services::telemetry::{emit_page_view, TelemetrySink};

use super::cache::QueryCache;
use super::panel::IntegrationsPanel;
use super::ClientError;

/// Session as reported by the authentication provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub loading: bool,
    pub present: bool,
}

/// Drives the gate for one application instance.
pub struct ShellDriver {
    gate: Gate,
    cache: QueryCache,
    telemetry: Arc<dyn TelemetrySink>,
    onboarding_introduced_at: NaiveDate,
    viewer: ViewerStatus,
    session_rejected: bool,
}

impl ShellDriver {
    pub fn new(
        route: &str,
        cache: QueryCache,
        telemetry: Arc<dyn TelemetrySink>,
        onboarding_introduced_at: NaiveDate,
    ) -> Self {
        emit_page_view(Arc::clone(&telemetry), route);
        Self {
            gate: Gate::new(route),
            cache,
            telemetry,
            onboarding_introduced_at,
            viewer: ViewerStatus::Pending,
            session_rejected: false,
        }
    }

    pub fn route(&self) -> &str {
        self.gate.route()
    }

    /// Emits one page view per actual path change.
    pub fn navigate(&mut self, route: &str) -> bool {
        let changed = self.gate.navigate(route);
        if changed {
            emit_page_view(Arc::clone(&self.telemetry), route);
        }
        changed
    }

    pub async fn update(&mut self, session: SessionSnapshot, locale: LocaleStatus) -> GateOutput {
        if session.present && self.viewer == ViewerStatus::Pending && !self.session_rejected {
            self.viewer = match self.cache.viewer().await {
                Ok(viewer) if viewer_needs_onboarding(&viewer, self.onboarding_introduced_at) => {
                    ViewerStatus::NeedsOnboarding
                }
                Ok(_) => ViewerStatus::Onboarded,
                Err(ClientError::Unauthenticated) => {
                    self.session_rejected = true;
                    ViewerStatus::Pending
                }
                Err(_) => ViewerStatus::Failed,
            };
        }

        let input = GateInput {
            session_loading: session.loading,
            has_session: session.present && !self.session_rejected,
            viewer: self.viewer,
            locale,
        };
        self.gate.update(&input)
    }

    /// Clears a failed identity fetch so the next update tries again.
    pub fn retry(&mut self) {
        if self.viewer == ViewerStatus::Failed {
            self.viewer = ViewerStatus::Pending;
        }
    }

    /// Target to navigate to, or `None` when the redirect went stale.
    pub fn commit<'r>(&self, redirect: &'r PendingRedirect) -> Option<&'r str> {
        if self.gate.is_current(redirect) {
            Some(redirect.target.as_str())
        } else {
            tracing::debug!(route = %redirect.route, "dropping stale redirect");
            None
        }
    }

    pub fn cache(&mut self) -> &mut QueryCache {
        &mut self.cache
    }

    pub fn integrations_panel(&mut self) -> IntegrationsPanel<'_> {
        IntegrationsPanel::new(&mut self.cache)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::client::panel::PanelView;
    use crate::client::testing::MockApi;
    use crate::client::ViewerApi;
    use crate::gate::{GatePhase, GateView, ONBOARDING_PATH};
    use crate::services::telemetry::PageViewEvent;

    struct RecordingSink {
        paths: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TelemetrySink for RecordingSink {
        async fn track(&self, event: &PageViewEvent) -> anyhow::Result<()> {
            self.paths.lock().unwrap().push(event.page_path.clone());
            Ok(())
        }
    }

    fn driver(api: &Arc<MockApi>, route: &str) -> ShellDriver {
        let cache =
            QueryCache::new(Arc::clone(api) as Arc<dyn ViewerApi>).with_retry_delay(Duration::ZERO);
        ShellDriver::new(
            route,
            cache,
            Arc::new(RecordingSink {
                paths: Mutex::new(vec![]),
            }),
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
        )
    }

    const LOADED: SessionSnapshot = SessionSnapshot {
        loading: false,
        present: true,
    };

    #[tokio::test]
    async fn test_loading_session_shows_spinner_without_fetching() {
        let api = Arc::new(MockApi::new());
        let mut shell = driver(&api, "/integrations");

        let out = shell
            .update(SessionSnapshot { loading: true, present: false }, LocaleStatus::Ready)
            .await;
        assert_eq!(out.phase, GatePhase::CheckingSession);
        assert_eq!(out.view, GateView::Loading);
        assert_eq!(api.me_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_session_redirects_once() {
        let api = Arc::new(MockApi::new());
        let mut shell = driver(&api, "/integrations?x=1");
        let gone = SessionSnapshot { loading: false, present: false };

        let out = shell.update(gone, LocaleStatus::Ready).await;
        let redirect = out.redirect.unwrap();
        assert_eq!(
            shell.commit(&redirect),
            Some("/auth/login?callbackUrl=%2Fintegrations%3Fx%3D1")
        );
        assert!(shell.update(gone, LocaleStatus::Ready).await.redirect.is_none());
    }

    #[tokio::test]
    async fn test_incomplete_onboarding_redirects() {
        let api = Arc::new(MockApi::new());
        api.completed_onboarding.store(false, Ordering::SeqCst);
        let mut shell = driver(&api, "/event-types");

        let out = shell.update(LOADED, LocaleStatus::Ready).await;
        assert_eq!(out.view, GateView::Loading);
        assert_eq!(out.redirect.unwrap().target, ONBOARDING_PATH);
    }

    #[tokio::test]
    async fn test_onboarded_viewer_reaches_content_and_panel() {
        let api = Arc::new(MockApi::new().with_credential(3, "stripe_payment"));
        let mut shell = driver(&api, "/integrations");

        let out = shell.update(LOADED, LocaleStatus::Loading).await;
        assert_eq!(out.view, GateView::Loading);
        let out = shell.update(LOADED, LocaleStatus::Ready).await;
        assert_eq!(out.view, GateView::Content);
        assert_eq!(api.me_calls.load(Ordering::SeqCst), 1);

        let PanelView::Ready(sections) = shell.integrations_panel().load().await else {
            panic!("expected ready panel");
        };
        assert_eq!(sections[1].num_active, 1);
    }

    #[tokio::test]
    async fn test_identity_failure_then_retry() {
        let api = Arc::new(MockApi::new());
        api.me_failures_left.store(4, Ordering::SeqCst);
        let mut shell = driver(&api, "/availability");

        let out = shell.update(LOADED, LocaleStatus::Ready).await;
        assert_eq!(out.view, GateView::Error);

        shell.retry();
        let out = shell.update(LOADED, LocaleStatus::Ready).await;
        assert_eq!(out.view, GateView::Content);
    }

    #[tokio::test]
    async fn test_navigation_drops_stale_redirect() {
        let api = Arc::new(MockApi::new());
        let mut shell = driver(&api, "/availability");
        let out = shell
            .update(SessionSnapshot { loading: false, present: false }, LocaleStatus::Ready)
            .await;
        let redirect = out.redirect.unwrap();

        assert!(shell.navigate("/bookings/upcoming"));
        assert_eq!(shell.commit(&redirect), None);
        assert!(!shell.navigate("/bookings/upcoming"));
    }

    struct FlakySink {
        fail: AtomicBool,
        calls: AtomicU32,
    }

    #[async_trait]
    impl TelemetrySink for FlakySink {
        async fn track(&self, _event: &PageViewEvent) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("collector down");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_page_view_per_path_change() {
        let api = Arc::new(MockApi::new());
        let sink = Arc::new(FlakySink {
            fail: AtomicBool::new(true),
            calls: AtomicU32::new(0),
        });
        let cache =
            QueryCache::new(Arc::clone(&api) as Arc<dyn ViewerApi>).with_retry_delay(Duration::ZERO);
        let mut shell = ShellDriver::new(
            "/integrations",
            cache,
            Arc::clone(&sink) as Arc<dyn TelemetrySink>,
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
        );
        shell.navigate("/integrations");
        shell.navigate("/availability");

        let out = shell.update(LOADED, LocaleStatus::Ready).await;
        assert_eq!(out.view, GateView::Content);

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
    }
}
