use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Credential;

/// Weekly availability rule. `days` uses 0 = Sunday; times are minutes from midnight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRule {
    pub days: Vec<u8>,
    pub start_time: i32,
    pub end_time: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectedCalendar {
    pub integration: String,
    pub external_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub time_zone: String,
    pub buffer_time: i32,
    pub start_time: i32,
    pub end_time: i32,
    pub availability: Vec<AvailabilityRule>,
    pub completed_onboarding: bool,
    pub created_at: NaiveDateTime,
}

/// Fields accepted when a user row is created by the signup flow.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub completed_onboarding: bool,
    pub created_at: Option<NaiveDateTime>,
}

impl NewUser {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            ..Default::default()
        }
    }
}

/// The `viewer.me` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewerRecord {
    pub id: i64,
    pub username: String,
    pub credentials: Vec<Credential>,
    pub time_zone: String,
    pub buffer_time: i32,
    pub availability: Vec<AvailabilityRule>,
    pub start_time: i32,
    pub end_time: i32,
    pub selected_calendars: Vec<SelectedCalendar>,
    pub completed_onboarding: bool,
    pub created_at: NaiveDateTime,
}

impl ViewerRecord {
    pub fn from_parts(
        user: User,
        credentials: Vec<Credential>,
        selected_calendars: Vec<SelectedCalendar>,
    ) -> Self {
        Self {
            id: user.id,
            username: user.username,
            credentials,
            time_zone: user.time_zone,
            buffer_time: user.buffer_time,
            availability: user.availability,
            start_time: user.start_time,
            end_time: user.end_time,
            selected_calendars,
            completed_onboarding: user.completed_onboarding,
            created_at: user.created_at,
        }
    }
}
