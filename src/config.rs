use std::env;

use chrono::NaiveDate;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub session_secret: String,
    pub session_ttl_minutes: i64,
    pub telemetry_url: String,
    pub public_url: String,
    pub onboarding_introduced_at: NaiveDate,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "calhub.db".to_string()),
            session_secret: env::var("SESSION_SECRET").unwrap_or_else(|_| "changeme".to_string()),
            session_ttl_minutes: env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60 * 24 * 30),
            telemetry_url: env::var("TELEMETRY_URL").unwrap_or_default(),
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            onboarding_introduced_at: env::var("ONBOARDING_INTRODUCED_AT")
                .ok()
                .and_then(|v| NaiveDate::parse_from_str(&v, "%Y-%m-%d").ok())
                .unwrap_or_else(default_onboarding_date),
        }
    }
}

pub fn default_onboarding_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 9, 1).unwrap_or(NaiveDate::MIN)
}
