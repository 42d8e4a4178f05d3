//! JSON accessors over a key/value store and the catalog snapshot policy.

use color_eyre::{eyre::eyre, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

use super::traits::{keys, KeyValueStore};
use crate::catalog::Product;

/// Async JSON view of a key/value store.
///
/// The backend is synchronous; the async surface keeps persistence at the same
/// suspension points as network I/O.
pub struct LocalCache<S: KeyValueStore> {
  store: Arc<S>,
}

impl<S: KeyValueStore> LocalCache<S> {
  pub fn new(store: S) -> Self {
    Self {
      store: Arc::new(store),
    }
  }

  pub fn store(&self) -> &Arc<S> {
    &self.store
  }

  /// Read and deserialize the value under `key`
  pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
    match self.store.get_raw(key)? {
      Some(raw) => serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| eyre!("Failed to decode {}: {}", key, e)),
      None => Ok(None),
    }
  }

  /// Serialize `value` and store it under `key`
  pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
    let raw =
      serde_json::to_string(value).map_err(|e| eyre!("Failed to encode {}: {}", key, e))?;
    self.store.set_raw(key, &raw)
  }
}

impl<S: KeyValueStore> Clone for LocalCache<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
    }
  }
}

/// Whether a snapshot taken at `cached_at_ms` may still be painted at `now_ms`
pub fn is_fresh(cached_at_ms: i64, now_ms: i64, ttl_ms: i64) -> bool {
  now_ms.saturating_sub(cached_at_ms) < ttl_ms
}

/// Last successful catalog fetch, stored under two fixed keys
pub struct SnapshotCache<S: KeyValueStore> {
  cache: LocalCache<S>,
  ttl_ms: i64,
}

impl<S: KeyValueStore> SnapshotCache<S> {
  pub fn new(cache: LocalCache<S>, ttl_ms: i64) -> Self {
    Self { cache, ttl_ms }
  }

  /// Cached products if a snapshot exists and is younger than the TTL.
  ///
  /// Read or decode errors count as "no snapshot".
  pub async fn read_fresh(&self, now_ms: i64) -> Option<Vec<Product>> {
    let cached_at = match self.cache.get::<i64>(keys::PRODUCTS_TS).await {
      Ok(Some(ts)) => ts,
      Ok(None) => return None,
      Err(e) => {
        tracing::debug!(error = %e, "unreadable snapshot timestamp");
        return None;
      }
    };

    if !is_fresh(cached_at, now_ms, self.ttl_ms) {
      tracing::debug!(age_ms = now_ms - cached_at, "cached snapshot is stale");
      return None;
    }

    match self.cache.get::<Vec<Product>>(keys::PRODUCTS).await {
      Ok(products) => products,
      Err(e) => {
        tracing::debug!(error = %e, "unreadable snapshot");
        None
      }
    }
  }

  /// Overwrite the snapshot and its timestamp
  pub async fn write(&self, products: &[Product], now_ms: i64) -> Result<()> {
    self.cache.set(keys::PRODUCTS, products).await?;
    self.cache.set(keys::PRODUCTS_TS, &now_ms).await
  }
}

impl<S: KeyValueStore> Clone for SnapshotCache<S> {
  fn clone(&self) -> Self {
    Self {
      cache: self.cache.clone(),
      ttl_ms: self.ttl_ms,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStore;
  use crate::catalog::demo::demo_products;

  const TTL: i64 = 600_000;

  fn snapshot_cache() -> SnapshotCache<MemoryStore> {
    SnapshotCache::new(LocalCache::new(MemoryStore::new()), TTL)
  }

  #[test]
  fn test_is_fresh_boundaries() {
    assert!(is_fresh(1_000, 1_000, TTL));
    assert!(is_fresh(1_000, 1_000 + TTL - 1, TTL));
    assert!(!is_fresh(1_000, 1_000 + TTL, TTL));
    assert!(!is_fresh(1_000, 1_000 + 601_000, TTL));
  }

  #[tokio::test]
  async fn test_json_round_trip_through_store() {
    let cache = LocalCache::new(MemoryStore::new());
    cache.set("gn_theme", "dark").await.unwrap();
    assert_eq!(
      cache.get::<String>("gn_theme").await.unwrap().as_deref(),
      Some("dark")
    );
    assert_eq!(cache.get::<String>("absent").await.unwrap(), None);
  }

  #[tokio::test]
  async fn test_corrupt_value_is_an_error() {
    let cache = LocalCache::new(MemoryStore::new());
    cache.store().set_raw("gn_cart", "{not json").unwrap();
    assert!(cache.get::<Vec<u8>>("gn_cart").await.is_err());
  }

  #[tokio::test]
  async fn test_snapshot_fresh_within_ttl() {
    let snapshots = snapshot_cache();
    let t = 1_700_000_000_000;
    snapshots.write(&demo_products(), t).await.unwrap();

    let read = snapshots.read_fresh(t + 599_999).await;
    assert_eq!(read, Some(demo_products()));
  }

  #[tokio::test]
  async fn test_snapshot_stale_after_ttl() {
    let snapshots = snapshot_cache();
    let t = 1_700_000_000_000;
    snapshots.write(&demo_products(), t).await.unwrap();

    assert_eq!(snapshots.read_fresh(t + 601_000).await, None);
  }

  #[tokio::test]
  async fn test_snapshot_missing_or_corrupt() {
    let snapshots = snapshot_cache();
    assert_eq!(snapshots.read_fresh(0).await, None);

    let store = snapshots.cache.store().clone();
    store.set_raw(keys::PRODUCTS_TS, "5").unwrap();
    store.set_raw(keys::PRODUCTS, "[{\"broken\": true}]").unwrap();
    assert_eq!(snapshots.read_fresh(10).await, None);
  }

  #[tokio::test]
  async fn test_snapshot_write_overwrites() {
    let snapshots = snapshot_cache();
    snapshots.write(&demo_products(), 0).await.unwrap();
    snapshots.write(&demo_products()[..1], 100).await.unwrap();

    let read = snapshots.read_fresh(200).await.unwrap();
    assert_eq!(read.len(), 1);
    assert_eq!(read[0].id, "p1");
  }
}
