use chrono::{Duration, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{ConnectState, IntegrationDescriptor, Integrations, ZERO_CONFIG_PROVIDER};
use crate::services::catalog::ProviderCatalog;
use crate::services::integrations::fetch_integrations;

/// How long an issued authorization code stays redeemable.
pub const CONNECT_STATE_TTL_MINUTES: i64 = 10;

/// Cached query names shared by the API and the client cache.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum QueryKey {
    #[serde(rename = "viewer.me")]
    ViewerMe,
    #[serde(rename = "viewer.integrations")]
    ViewerIntegrations,
}

/// Returned by every successful mutation; the holder of the cache applies it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Refresh {
    pub invalidate: Vec<QueryKey>,
}

impl Refresh {
    pub fn integrations() -> Self {
        Self {
            invalidate: vec![QueryKey::ViewerIntegrations],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    #[error("unknown provider type: {0}")]
    UnknownProvider(String),
    #[error("{0} is not installed")]
    NotInstalled(String),
    #[error("{0} is available without connecting")]
    ZeroConfig(String),
    #[error("credential {0} is not held by the viewer")]
    UnknownCredential(i64),
    #[error("authorization code was not issued for this connection")]
    UnknownAuthorization,
}

impl From<ConnectionError> for AppError {
    fn from(e: ConnectionError) -> Self {
        AppError::InvalidAction(e.to_string())
    }
}

pub fn validate_connect<'a>(
    integrations: &'a Integrations,
    provider_type: &str,
) -> Result<&'a IntegrationDescriptor, ConnectionError> {
    let descriptor = integrations
        .descriptor(provider_type)
        .ok_or_else(|| ConnectionError::UnknownProvider(provider_type.to_string()))?;
    if !descriptor.installed {
        return Err(ConnectionError::NotInstalled(provider_type.to_string()));
    }
    if provider_type == ZERO_CONFIG_PROVIDER {
        return Err(ConnectionError::ZeroConfig(provider_type.to_string()));
    }
    Ok(descriptor)
}

pub fn validate_disconnect(
    integrations: &Integrations,
    credential_id: i64,
) -> Result<&IntegrationDescriptor, ConnectionError> {
    integrations
        .descriptor_for_credential(credential_id)
        .ok_or(ConnectionError::UnknownCredential(credential_id))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectStart {
    pub url: String,
    #[serde(flatten)]
    pub refresh: Refresh,
}

/// Validates a connect request and hands back the authorization entry point.
pub fn begin_connect(
    conn: &Connection,
    catalog: &ProviderCatalog,
    public_url: &str,
    user_id: i64,
    provider_type: &str,
) -> Result<ConnectStart, AppError> {
    let integrations = fetch_integrations(conn, catalog, user_id)?;
    validate_connect(&integrations, provider_type)?;

    let state = ConnectState {
        code: Uuid::new_v4().to_string(),
        user_id,
        provider_type: provider_type.to_string(),
        expires_at: Utc::now().naive_utc() + Duration::minutes(CONNECT_STATE_TTL_MINUTES),
    };
    queries::insert_connect_state(conn, &state)?;

    let url = format!(
        "{}/api/integrations/{}/callback?code={}",
        public_url.trim_end_matches('/'),
        provider_type,
        state.code
    );
    tracing::info!(user_id, provider = provider_type, "connect started");
    Ok(ConnectStart {
        url,
        refresh: Refresh::integrations(),
    })
}

/// Stores the credential produced by a finished authorization flow. The code
/// must have been issued by `begin_connect` to the same user and provider.
pub fn complete_connect(
    conn: &Connection,
    catalog: &ProviderCatalog,
    user_id: i64,
    provider_type: &str,
    code: &str,
) -> Result<(i64, Refresh), AppError> {
    let issued = queries::take_connect_state(conn, code)?.filter(|state| {
        state.user_id == user_id
            && state.provider_type == provider_type
            && state.expires_at > Utc::now().naive_utc()
    });
    if issued.is_none() {
        tracing::warn!(user_id, provider = provider_type, "rejected unknown authorization code");
        return Err(ConnectionError::UnknownAuthorization.into());
    }

    let integrations = fetch_integrations(conn, catalog, user_id)?;
    validate_connect(&integrations, provider_type)?;

    let key = serde_json::json!({ "code": code });
    let id = queries::insert_credential(conn, user_id, provider_type, &key)?;
    tracing::info!(user_id, provider = provider_type, credential_id = id, "credential stored");
    Ok((id, Refresh::integrations()))
}

pub fn disconnect(
    conn: &Connection,
    catalog: &ProviderCatalog,
    user_id: i64,
    credential_id: i64,
) -> Result<Refresh, AppError> {
    let integrations = fetch_integrations(conn, catalog, user_id)?;
    let descriptor = validate_disconnect(&integrations, credential_id)?;
    let provider = descriptor.provider_type.clone();

    if !queries::delete_credential(conn, user_id, credential_id)? {
        return Err(AppError::NotFound(format!("credential {credential_id}")));
    }
    tracing::info!(user_id, provider = %provider, credential_id, "credential removed");
    Ok(Refresh::integrations())
}
