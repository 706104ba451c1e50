use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::ViewerRecord;

/// Users created before onboarding existed are never sent through it.
/// Onboarding starts at midnight of `introduced_at`, so signups made later
/// that same day go through it.
pub fn should_show_onboarding(
    completed_onboarding: bool,
    created_at: NaiveDateTime,
    introduced_at: NaiveDate,
) -> bool {
    !completed_onboarding && created_at > introduced_at.and_time(NaiveTime::MIN)
}

pub fn viewer_needs_onboarding(viewer: &ViewerRecord, introduced_at: NaiveDate) -> bool {
    should_show_onboarding(viewer.completed_onboarding, viewer.created_at, introduced_at)
}

/// Succeeds only for a user that exists and has finished onboarding. A
/// half-finished signup is reported exactly like a missing one.
pub fn check_user_exists(conn: &Connection, username: Option<&str>) -> Result<(), AppError> {
    let Some(username) = username.filter(|u| !u.is_empty()) else {
        return Err(AppError::UserNotFound);
    };

    match queries::find_user_by_username(conn, username)? {
        Some(user) if user.completed_onboarding => Ok(()),
        _ => Err(AppError::UserNotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_onboarding_date;
    use crate::db;
    use crate::models::NewUser;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_new_incomplete_user_needs_onboarding() {
        assert!(should_show_onboarding(false, dt("2022-01-10 09:00"), default_onboarding_date()));
    }

    #[test]
    fn test_legacy_user_skips_onboarding() {
        assert!(!should_show_onboarding(false, dt("2021-06-01 09:00"), default_onboarding_date()));
    }

    #[test]
    fn test_cutoff_day_signup_needs_onboarding() {
        assert!(should_show_onboarding(false, dt("2021-09-01 10:00"), default_onboarding_date()));
        assert!(!should_show_onboarding(false, dt("2021-09-01 00:00"), default_onboarding_date()));
        assert!(!should_show_onboarding(false, dt("2021-08-31 23:59"), default_onboarding_date()));
    }

    #[test]
    fn test_completed_user_skips_onboarding() {
        assert!(!should_show_onboarding(true, dt("2022-01-10 09:00"), default_onboarding_date()));
    }

    #[test]
    fn test_exists_conflates_missing_and_incomplete() {
        let conn = db::init_db(":memory:").unwrap();
        queries::create_user(&conn, &NewUser::new("alice")).unwrap();
        queries::create_user(
            &conn,
            &NewUser {
                completed_onboarding: true,
                ..NewUser::new("bob")
            },
        )
        .unwrap();

        assert!(matches!(check_user_exists(&conn, Some("ghost")), Err(AppError::UserNotFound)));
        assert!(matches!(check_user_exists(&conn, Some("alice")), Err(AppError::UserNotFound)));
        assert!(matches!(check_user_exists(&conn, None), Err(AppError::UserNotFound)));
        assert!(check_user_exists(&conn, Some("bob")).is_ok());
    }
}
