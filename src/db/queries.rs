use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{AvailabilityRule, ConnectState, Credential, NewUser, SelectedCalendar, User};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_timestamp(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Users ──

const USER_COLUMNS: &str = "id, username, name, email, time_zone, buffer_time, start_time, end_time, \
                            availability, completed_onboarding, created_at";

fn parse_user_row(row: &Row) -> rusqlite::Result<(User, String)> {
    let availability_json: String = row.get(8)?;
    let created_at: String = row.get(10)?;
    Ok((
        User {
            id: row.get(0)?,
            username: row.get(1)?,
            name: row.get(2)?,
            email: row.get(3)?,
            time_zone: row.get(4)?,
            buffer_time: row.get(5)?,
            start_time: row.get(6)?,
            end_time: row.get(7)?,
            availability: Vec::new(),
            completed_onboarding: row.get::<_, i32>(9)? != 0,
            created_at: parse_timestamp(&created_at),
        },
        availability_json,
    ))
}

fn finish_user(parsed: (User, String)) -> anyhow::Result<User> {
    let (mut user, availability_json) = parsed;
    user.availability = serde_json::from_str::<Vec<AvailabilityRule>>(&availability_json)?;
    Ok(user)
}

pub fn find_user_by_username(conn: &Connection, username: &str) -> anyhow::Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
    conn.query_row(&sql, params![username], parse_user_row)
        .optional()?
        .map(finish_user)
        .transpose()
}

pub fn get_user(conn: &Connection, id: i64) -> anyhow::Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    conn.query_row(&sql, params![id], parse_user_row)
        .optional()?
        .map(finish_user)
        .transpose()
}

pub fn create_user(conn: &Connection, user: &NewUser) -> anyhow::Result<i64> {
    let created_at = user
        .created_at
        .unwrap_or_else(|| Utc::now().naive_utc())
        .format(TIMESTAMP_FORMAT)
        .to_string();
    conn.execute(
        "INSERT INTO users (username, name, email, completed_onboarding, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.username,
            user.name,
            user.email,
            user.completed_onboarding as i32,
            created_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

// ── Credentials ──

fn parse_credential_row(row: &Row) -> rusqlite::Result<Credential> {
    let created_at: String = row.get(3)?;
    Ok(Credential {
        id: row.get(0)?,
        provider_type: row.get(1)?,
        user_id: row.get(2)?,
        created_at: parse_timestamp(&created_at),
    })
}

/// Credentials owned by `user_id`, oldest first.
pub fn list_credentials(conn: &Connection, user_id: i64) -> anyhow::Result<Vec<Credential>> {
    let mut stmt = conn.prepare(
        "SELECT id, type, user_id, created_at FROM credentials WHERE user_id = ?1 ORDER BY id ASC",
    )?;

    let rows = stmt.query_map(params![user_id], parse_credential_row)?;

    let mut credentials = vec![];
    for row in rows {
        credentials.push(row?);
    }
    Ok(credentials)
}

pub fn insert_credential(
    conn: &Connection,
    user_id: i64,
    provider_type: &str,
    key: &serde_json::Value,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO credentials (type, key, user_id) VALUES (?1, ?2, ?3)",
        params![provider_type, serde_json::to_string(key)?, user_id],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Deletes a credential only when it belongs to `user_id`.
pub fn delete_credential(conn: &Connection, user_id: i64, credential_id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM credentials WHERE id = ?1 AND user_id = ?2",
        params![credential_id, user_id],
    )?;
    Ok(count > 0)
}

// ── Connect states ──

pub fn insert_connect_state(conn: &Connection, state: &ConnectState) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO connect_states (code, user_id, provider_type, expires_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            state.code,
            state.user_id,
            state.provider_type,
            state.expires_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

/// Removes and returns the pending flow for `code`. A code is usable once.
pub fn take_connect_state(conn: &Connection, code: &str) -> anyhow::Result<Option<ConnectState>> {
    let state = conn
        .query_row(
            "SELECT code, user_id, provider_type, expires_at FROM connect_states WHERE code = ?1",
            params![code],
            |row| {
                let expires_at: String = row.get(3)?;
                Ok(ConnectState {
                    code: row.get(0)?,
                    user_id: row.get(1)?,
                    provider_type: row.get(2)?,
                    expires_at: parse_timestamp(&expires_at),
                })
            },
        )
        .optional()?;

    if state.is_some() {
        conn.execute("DELETE FROM connect_states WHERE code = ?1", params![code])?;
    }
    Ok(state)
}

// ── Selected calendars ──

pub fn list_selected_calendars(
    conn: &Connection,
    user_id: i64,
) -> anyhow::Result<Vec<SelectedCalendar>> {
    let mut stmt = conn.prepare(
        "SELECT integration, external_id FROM selected_calendars WHERE user_id = ?1
         ORDER BY integration, external_id",
    )?;

    let rows = stmt.query_map(params![user_id], |row| {
        Ok(SelectedCalendar {
            integration: row.get(0)?,
            external_id: row.get(1)?,
        })
    })?;

    let mut calendars = vec![];
    for row in rows {
        calendars.push(row?);
    }
    Ok(calendars)
}

pub fn select_calendar(
    conn: &Connection,
    user_id: i64,
    integration: &str,
    external_id: &str,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO selected_calendars (user_id, integration, external_id) VALUES (?1, ?2, ?3)",
        params![user_id, integration, external_id],
    )?;
    Ok(())
}
