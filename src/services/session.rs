use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// Resolves a raw session token into a live session, if any.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn resolve(&self, token: &str) -> anyhow::Result<Option<Session>>;
}

/// Bearer token first, then the session cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
        {
            return Some(token.trim().to_string());
        }
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// Tokens are `<user_id>.<expires_unix>.<signature>` signed with HMAC-SHA1.
pub struct HmacSessionProvider {
    secret: String,
    ttl: Duration,
}

impl HmacSessionProvider {
    pub fn new(secret: String, ttl_minutes: i64) -> Self {
        Self {
            secret,
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    fn mac(&self, payload: &str) -> Option<Hmac<Sha1>> {
        let mut mac = Hmac::<Sha1>::new_from_slice(self.secret.as_bytes()).ok()?;
        mac.update(payload.as_bytes());
        Some(mac)
    }

    pub fn issue(&self, user_id: i64) -> String {
        self.issue_until(user_id, Utc::now() + self.ttl)
    }

    pub fn issue_until(&self, user_id: i64, expires_at: DateTime<Utc>) -> String {
        let payload = format!("{user_id}.{}", expires_at.timestamp());
        let signature = self
            .mac(&payload)
            .map(|m| URL_SAFE_NO_PAD.encode(m.finalize().into_bytes()))
            .unwrap_or_default();
        format!("{payload}.{signature}")
    }

    pub fn verify(&self, token: &str) -> Option<Session> {
        let (payload, signature) = token.rsplit_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        self.mac(payload)?.verify_slice(&signature).ok()?;

        let (user_id, expires) = payload.split_once('.')?;
        let user_id: i64 = user_id.parse().ok()?;
        let expires_at = DateTime::<Utc>::from_timestamp(expires.parse().ok()?, 0)?;
        if expires_at <= Utc::now() {
            return None;
        }
        Some(Session { user_id, expires_at })
    }
}

#[async_trait]
impl SessionProvider for HmacSessionProvider {
    async fn resolve(&self, token: &str) -> anyhow::Result<Option<Session>> {
        Ok(self.verify(token))
    }
}
