//! Shell asset caches kept in the SQLite store.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, OptionalExtension};

use super::{AssetCache, AssetResponse};
use crate::cache::SqliteStore;

impl AssetCache for SqliteStore {
  fn cache_names(&self) -> Result<Vec<String>> {
    self.with_conn(|conn| {
      let mut stmt = conn
        .prepare("SELECT cache_name FROM shell_caches ORDER BY cache_name")
        .map_err(|e| eyre!("Failed to prepare query: {}", e))?;
      let names = stmt
        .query_map([], |row| row.get(0))
        .map_err(|e| eyre!("Failed to list shell caches: {}", e))?
        .collect::<Result<Vec<String>, _>>()
        .map_err(|e| eyre!("Failed to read shell cache row: {}", e))?;
      Ok(names)
    })
  }

  fn open(&self, cache_name: &str) -> Result<()> {
    self.with_conn(|conn| {
      conn
        .execute(
          "INSERT OR IGNORE INTO shell_caches (cache_name) VALUES (?1)",
          params![cache_name],
        )
        .map_err(|e| eyre!("Failed to open shell cache {}: {}", cache_name, e))?;
      Ok(())
    })
  }

  fn lookup(&self, cache_name: &str, url: &str) -> Result<Option<AssetResponse>> {
    self.with_conn(|conn| {
      conn
        .query_row(
          "SELECT status, content_type, body FROM shell_assets WHERE cache_name = ?1 AND url = ?2",
          params![cache_name, url],
          |row| {
            Ok(AssetResponse {
              status: row.get(0)?,
              content_type: row.get(1)?,
              body: row.get(2)?,
            })
          },
        )
        .optional()
        .map_err(|e| eyre!("Failed to read shell asset {}: {}", url, e))
    })
  }

  fn put(&self, cache_name: &str, url: &str, response: &AssetResponse) -> Result<()> {
    self.with_conn(|conn| {
      conn
        .execute(
          "INSERT OR IGNORE INTO shell_caches (cache_name) VALUES (?1)",
          params![cache_name],
        )
        .map_err(|e| eyre!("Failed to open shell cache {}: {}", cache_name, e))?;
      conn
        .execute(
          "INSERT OR REPLACE INTO shell_assets (cache_name, url, status, content_type, body)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![
            cache_name,
            url,
            response.status,
            response.content_type,
            response.body
          ],
        )
        .map_err(|e| eyre!("Failed to store shell asset {}: {}", url, e))?;
      Ok(())
    })
  }

  fn delete(&self, cache_name: &str) -> Result<bool> {
    self.with_conn(|conn| {
      conn
        .execute(
          "DELETE FROM shell_assets WHERE cache_name = ?1",
          params![cache_name],
        )
        .map_err(|e| eyre!("Failed to clear shell cache {}: {}", cache_name, e))?;
      let removed = conn
        .execute(
          "DELETE FROM shell_caches WHERE cache_name = ?1",
          params![cache_name],
        )
        .map_err(|e| eyre!("Failed to delete shell cache {}: {}", cache_name, e))?;
      Ok(removed > 0)
    })
  }

  fn active(&self) -> Result<Option<String>> {
    self.with_conn(|conn| {
      conn
        .query_row(
          "SELECT cache_name FROM shell_caches WHERE active = 1",
          [],
          |row| row.get(0),
        )
        .optional()
        .map_err(|e| eyre!("Failed to read active shell cache: {}", e))
    })
  }

  fn set_active(&self, cache_name: &str) -> Result<()> {
    self.with_conn(|conn| {
      conn
        .execute(
          "UPDATE shell_caches SET active = (cache_name = ?1)",
          params![cache_name],
        )
        .map_err(|e| eyre!("Failed to activate shell cache {}: {}", cache_name, e))?;
      Ok(())
    })
  }
}
