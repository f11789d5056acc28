pub mod queries;
pub mod schema;

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

use schema::{SettingKey, DEFAULT_REFRESH_INTERVAL, DEFAULT_SERVER_URL};

pub type DbConn = Arc<Mutex<Connection>>;

/// Get the database path.
/// Uses GRABDESK_DATA_DIR env var, or falls back to ./data/
pub fn db_path() -> PathBuf {
    if let Ok(dir) = std::env::var("GRABDESK_DATA_DIR") {
        PathBuf::from(dir).join("grabdesk.db")
    } else {
        PathBuf::from("data").join("grabdesk.db")
    }
}

/// Server URL forced from the environment, if any.
pub fn server_url_override() -> Option<String> {
    std::env::var("GRABDESK_SERVER_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Open (or create) the database and run initialization.
pub fn open_database(path: &Path) -> Result<DbConn, rusqlite::Error> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    initialize_database(&conn)?;

    info!("Database opened at {}", path.display());
    Ok(Arc::new(Mutex::new(conn)))
}

/// In-memory database with the same schema.
#[cfg(test)]
pub fn open_in_memory() -> Result<DbConn, rusqlite::Error> {
    let conn = Connection::open_in_memory()?;
    initialize_database(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// Lock the connection. A poisoned lock still holds a usable connection.
pub(crate) fn lock(conn: &DbConn) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Create tables and insert default settings.
fn initialize_database(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS settings (
            key             TEXT PRIMARY KEY,
            value           TEXT NOT NULL
        );",
    )?;

    let download_dir = schema::default_download_dir();
    let defaults = [
        (SettingKey::ServerUrl, DEFAULT_SERVER_URL.to_string()),
        (SettingKey::SessionToken, String::new()),
        (SettingKey::DownloadDir, download_dir.display().to_string()),
        (SettingKey::RefreshIntervalSecs, DEFAULT_REFRESH_INTERVAL.to_string()),
    ];

    let mut stmt = conn.prepare("INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)")?;
    for (key, value) in &defaults {
        stmt.execute(rusqlite::params![key.as_str(), value])?;
    }

    info!("Database initialized");
    Ok(())
}
