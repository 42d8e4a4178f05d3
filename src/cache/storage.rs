//! Key/value storage backends: SQLite on disk, and an in-memory map.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use super::traits::KeyValueStore;

/// Store kept only for the lifetime of the process.
///
/// Used for `--no-cache` runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
  values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl KeyValueStore for MemoryStore {
  fn get_raw(&self, key: &str) -> Result<Option<String>> {
    let values = self
      .values
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(values.get(key).cloned())
  }

  fn set_raw(&self, key: &str, value: &str) -> Result<()> {
    let mut values = self
      .values
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    values.insert(key.to_string(), value.to_string());
    Ok(())
  }
}

/// SQLite-backed store.
///
/// The same database file also holds the offline shell's asset caches.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open or create the store at `path`
  pub fn open(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create data directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open store at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// In-memory SQLite database, same schema
  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self> {
    let conn =
      Connection::open_in_memory().map_err(|e| eyre!("Failed to open in-memory store: {}", e))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(STORE_SCHEMA)
      .map_err(|e| eyre!("Failed to run store migrations: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Run `f` with the locked connection
  pub(crate) fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    f(&conn)
  }
}

/// Schema for the key/value table and the shell asset cache.
const STORE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS shell_assets (
    cache_name TEXT NOT NULL,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    content_type TEXT,
    body BLOB NOT NULL,
    PRIMARY KEY (cache_name, url)
);

CREATE TABLE IF NOT EXISTS shell_caches (
    cache_name TEXT PRIMARY KEY,
    active INTEGER NOT NULL DEFAULT 0
);
"#;

impl KeyValueStore for SqliteStore {
  fn get_raw(&self, key: &str) -> Result<Option<String>> {
    self.with_conn(|conn| {
      conn
        .query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| {
          row.get(0)
        })
        .optional()
        .map_err(|e| eyre!("Failed to read key {}: {}", key, e))
    })
  }

  fn set_raw(&self, key: &str, value: &str) -> Result<()> {
    self.with_conn(|conn| {
      conn
        .execute(
          "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?, ?, datetime('now'))",
          params![key, value],
        )
        .map_err(|e| eyre!("Failed to write key {}: {}", key, e))?;
      Ok(())
    })
  }
}
