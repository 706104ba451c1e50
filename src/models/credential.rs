use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A stored connection to a third-party provider. The provider key material
/// stays in the database and is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id: i64,
    #[serde(rename = "type")]
    pub provider_type: String,
    pub user_id: i64,
    pub created_at: NaiveDateTime,
}

/// An authorization flow handed out by connect and not yet completed.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectState {
    pub code: String,
    pub user_id: i64,
    pub provider_type: String,
    pub expires_at: NaiveDateTime,
}
