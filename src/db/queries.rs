use super::schema::*;
use super::{lock, DbConn};
use rusqlite::{params, Row};

fn row_to_setting(row: &Row<'_>) -> rusqlite::Result<Setting> {
    Ok(Setting {
        key: row.get("key")?,
        value: row.get("value")?,
    })
}

pub fn fetch_settings(conn: &DbConn) -> rusqlite::Result<Vec<Setting>> {
    let db = lock(conn);
    let mut stmt = db.prepare("SELECT key, value FROM settings ORDER BY key")?;
    let settings = stmt
        .query_map([], row_to_setting)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(settings)
}

pub fn update_settings(conn: &DbConn, settings: &[(&str, &str)]) -> rusqlite::Result<()> {
    let mut db = lock(conn);
    let tx = db.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
        )?;
        for (key, value) in settings {
            stmt.execute(params![key, value])?;
        }
    }
    tx.commit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn get_setting(conn: &DbConn, key: SettingKey) -> rusqlite::Result<Option<String>> {
        let db = lock(conn);
        let mut stmt = db.prepare("SELECT value FROM settings WHERE key = ?1")?;
        let mut rows = stmt.query_map(params![key.as_str()], |row| row.get::<_, String>(0))?;
        rows.next().transpose()
    }

    #[test]
    fn test_defaults_are_seeded() {
        let conn = open_in_memory().unwrap();
        let settings = fetch_settings(&conn).unwrap();
        let keys: Vec<_> = settings.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["download_dir", "refresh_interval_secs", "server_url", "session_token"]
        );
        assert_eq!(
            get_setting(&conn, SettingKey::ServerUrl).unwrap().as_deref(),
            Some(DEFAULT_SERVER_URL)
        );
    }

    #[test]
    fn test_update_overwrites() {
        let conn = open_in_memory().unwrap();
        update_settings(&conn, &[("server_url", "http://nas:8000"), ("session_token", "tok")]).unwrap();
        assert_eq!(
            get_setting(&conn, SettingKey::ServerUrl).unwrap().as_deref(),
            Some("http://nas:8000")
        );
        assert_eq!(
            get_setting(&conn, SettingKey::SessionToken).unwrap().as_deref(),
            Some("tok")
        );
    }
}
