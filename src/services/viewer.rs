use rusqlite::Connection;

use crate::db::queries;
use crate::models::ViewerRecord;

/// Builds the `viewer.me` record; `None` when the user row is gone.
pub fn load_viewer(conn: &Connection, user_id: i64) -> anyhow::Result<Option<ViewerRecord>> {
    let Some(user) = queries::get_user(conn, user_id)? else {
        return Ok(None);
    };
    let credentials = queries::list_credentials(conn, user_id)?;
    let selected_calendars = queries::list_selected_calendars(conn, user_id)?;
    Ok(Some(ViewerRecord::from_parts(user, credentials, selected_calendars)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::NewUser;

    #[test]
    fn test_load_viewer_collects_related_rows() {
        let conn = db::init_db(":memory:").unwrap();
        let id = queries::create_user(&conn, &NewUser::new("hana")).unwrap();
        queries::insert_credential(&conn, id, "google_calendar", &serde_json::json!({})).unwrap();
        queries::select_calendar(&conn, id, "google_calendar", "hana@example.com").unwrap();

        let viewer = load_viewer(&conn, id).unwrap().unwrap();
        assert_eq!(viewer.username, "hana");
        assert_eq!(viewer.credentials.len(), 1);
        assert_eq!(viewer.selected_calendars[0].external_id, "hana@example.com");

        assert!(load_viewer(&conn, id + 100).unwrap().is_none());
    }
}
