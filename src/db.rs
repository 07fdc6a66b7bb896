use std::path::Path;

use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;
use crate::store::SnapshotStore;

/// Key-value slot backed by a single SQLite table
pub struct SqliteStore {
    conn: Connection,
    label: String,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        info!("Opening roster database {}", path.display());
        let conn = Connection::open(path)?;
        setup_database(&conn)?;
        Ok(SqliteStore {
            conn,
            label: format!("sqlite:{}", path.display()),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(SqliteStore {
            conn,
            label: "sqlite::memory:".to_string(),
        })
    }

    /// Keys with a stored value, oldest write first
    pub fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv_store ORDER BY updated_at, key")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

pub fn setup_database(conn: &Connection) -> Result<(), StoreError> {
    // Enable WAL mode for crash recovery; in-memory databases report "memory"
    let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;

    // ==========================================================================
    // Key-value slots (one row per storage key, value is the JSON snapshot)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    Ok(())
}

impl SnapshotStore for SqliteStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, strftime('%Y-%m-%d %H:%M:%f', 'now'))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            params![key, value],
        )?;
        debug!("Saved {} bytes under key {:?}", value.len(), key);
        Ok(())
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_key_loads_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.load("roster").unwrap(), None);
    }

    #[test]
    fn test_save_overwrites_single_row() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.save("roster", "[1]").unwrap();
        store.save("roster", "[1,2]").unwrap();

        assert_eq!(store.load("roster").unwrap().as_deref(), Some("[1,2]"));
        assert_eq!(store.keys().unwrap(), vec!["roster".to_string()]);
    }

    #[test]
    fn test_file_database_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("roster.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.save("roster", "{\"schema_version\":1}").unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(
            reopened.load("roster").unwrap().as_deref(),
            Some("{\"schema_version\":1}")
        );
        assert!(reopened.describe().starts_with("sqlite:"));
    }
}
