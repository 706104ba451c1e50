use crate::models::{Category, IntegrationDescriptor, Integrations, PrimaryAction};
use crate::services::connections::{validate_connect, validate_disconnect, ConnectStart, Refresh};

use super::cache::QueryCache;
use super::ClientError;

#[derive(Debug, Clone, PartialEq)]
pub struct PanelRow {
    pub descriptor: IntegrationDescriptor,
    pub action: PrimaryAction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelSection {
    pub category: Category,
    pub num_active: usize,
    pub rows: Vec<PanelRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelView {
    Ready(Vec<PanelSection>),
    /// The whole panel failed; nothing partial is shown.
    Error { message: String, retryable: bool },
}

pub fn sections(integrations: &Integrations) -> Vec<PanelSection> {
    Category::ALL
        .into_iter()
        .map(|category| {
            let group = integrations.category(category);
            PanelSection {
                category,
                num_active: group.num_active,
                rows: group
                    .items
                    .iter()
                    .map(|d| PanelRow {
                        descriptor: d.clone(),
                        action: d.primary_action(),
                    })
                    .collect(),
            }
        })
        .collect()
}

/// Integrations panel over a borrowed query cache.
pub struct IntegrationsPanel<'a> {
    cache: &'a mut QueryCache,
}

impl<'a> IntegrationsPanel<'a> {
    pub fn new(cache: &'a mut QueryCache) -> Self {
        Self { cache }
    }

    pub async fn load(&mut self) -> PanelView {
        match self.cache.integrations().await {
            Ok(integrations) => PanelView::Ready(sections(&integrations)),
            Err(e) => PanelView::Error {
                message: e.to_string(),
                retryable: !matches!(e, ClientError::Unauthenticated),
            },
        }
    }

    /// Starts the provider's authorization flow. Rejected requests never reach
    /// the server and leave the cache alone.
    pub async fn connect(&mut self, provider_type: &str) -> Result<ConnectStart, ClientError> {
        let integrations = self.cache.integrations().await?;
        validate_connect(&integrations, provider_type)?;

        let start = self.cache.api().connect(provider_type).await?;
        self.cache.apply(&start.refresh).await?;
        Ok(start)
    }

    /// Called when the authorization flow started by `connect` returns; the
    /// credential only exists from this point on.
    pub async fn connection_completed(&mut self) -> Result<(), ClientError> {
        self.cache.apply(&Refresh::integrations()).await
    }

    pub async fn disconnect(&mut self, credential_id: i64) -> Result<(), ClientError> {
        let integrations = self.cache.integrations().await?;
        validate_disconnect(&integrations, credential_id)?;

        let refresh = self.cache.api().disconnect(credential_id).await?;
        self.cache.apply(&refresh).await
    }
}
