use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PageViewEvent {
    pub event_id: String,
    pub event_type: &'static str,
    pub page_path: String,
    pub page_segments: Vec<String>,
    pub query_keys: Vec<String>,
    pub occurred_at: String,
}

impl PageViewEvent {
    pub fn new(path_and_query: &str) -> Self {
        let (path, query) = path_and_query
            .split_once('?')
            .unwrap_or((path_and_query, ""));
        Self {
            event_id: Uuid::new_v4().to_string(),
            event_type: "page_view",
            page_path: path.to_string(),
            page_segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            query_keys: query
                .split('&')
                .filter_map(|pair| pair.split('=').next())
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect(),
            occurred_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn track(&self, event: &PageViewEvent) -> anyhow::Result<()>;
}

pub struct HttpTelemetrySink {
    url: String,
    client: reqwest::Client,
}

impl HttpTelemetrySink {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TelemetrySink for HttpTelemetrySink {
    async fn track(&self, event: &PageViewEvent) -> anyhow::Result<()> {
        self.client
            .post(&self.url)
            .json(event)
            .send()
            .await
            .context("failed to deliver telemetry event")?
            .error_for_status()
            .context("telemetry endpoint returned error")?;
        Ok(())
    }
}

pub struct NoopTelemetry;

#[async_trait]
impl TelemetrySink for NoopTelemetry {
    async fn track(&self, _event: &PageViewEvent) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Fire-and-forget: delivery runs detached and its failures are dropped.
pub fn emit_page_view(sink: Arc<dyn TelemetrySink>, path_and_query: &str) {
    let event = PageViewEvent::new(path_and_query);
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        tracing::debug!(path = %event.page_path, "no runtime, page view dropped");
        return;
    };
    handle.spawn(async move {
        if let Err(e) = sink.track(&event).await {
            tracing::debug!(error = %e, path = %event.page_path, "page view not delivered");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_parameters_from_path() {
        let event = PageViewEvent::new("/bookings/upcoming?page=2&filter=");
        assert_eq!(event.page_path, "/bookings/upcoming");
        assert_eq!(event.page_segments, vec!["bookings", "upcoming"]);
        assert_eq!(event.query_keys, vec!["page", "filter"]);
        assert_eq!(event.event_type, "page_view");
    }

    struct FailingSink;

    #[async_trait]
    impl TelemetrySink for FailingSink {
        async fn track(&self, _event: &PageViewEvent) -> anyhow::Result<()> {
            anyhow::bail!("collector down")
        }
    }

    #[tokio::test]
    async fn test_emit_swallows_failures() {
        emit_page_view(Arc::new(FailingSink), "/integrations");
        tokio::task::yield_now().await;
    }

    #[test]
    fn test_emit_without_runtime_is_noop() {
        emit_page_view(Arc::new(NoopTelemetry), "/integrations");
    }
}
