//! Cache-then-refresh loading of the catalog.
//!
//! Startup paints a fresh-enough cached snapshot right away, then always asks
//! the remote source for a new list. Every successful fetch overwrites the
//! snapshot, whether or not the cached one was still fresh.

use crate::cache::{KeyValueStore, SnapshotCache};
use crate::catalog::{CatalogClient, FetchedCatalog, ImageReplacement, ImageShrinker, Product};
use chrono::Utc;

pub fn now_ms() -> i64 {
  Utc::now().timestamp_millis()
}

pub struct CatalogLoader<S: KeyValueStore> {
  client: CatalogClient,
  shrinker: Option<ImageShrinker>,
  snapshots: SnapshotCache<S>,
}

impl<S: KeyValueStore> Clone for CatalogLoader<S> {
  fn clone(&self) -> Self {
    Self {
      client: self.client.clone(),
      shrinker: self.shrinker.clone(),
      snapshots: self.snapshots.clone(),
    }
  }
}

impl<S: KeyValueStore> CatalogLoader<S> {
  pub fn new(
    client: CatalogClient,
    shrinker: Option<ImageShrinker>,
    snapshots: SnapshotCache<S>,
  ) -> Self {
    Self {
      client,
      shrinker,
      snapshots,
    }
  }

  /// Cached products for the instant paint, if younger than the TTL
  pub async fn load_cached(&self) -> Option<Vec<Product>> {
    self.load_cached_at(now_ms()).await
  }

  pub async fn load_cached_at(&self, now_ms: i64) -> Option<Vec<Product>> {
    let cached = self.snapshots.read_fresh(now_ms).await;
    if let Some(products) = &cached {
      tracing::info!(count = products.len(), "painting cached catalog");
    }
    cached
  }

  /// Fetch a new catalog and persist it. Image work is left to `shrink_images`.
  pub async fn refresh(&self) -> FetchedCatalog {
    self.refresh_at(now_ms()).await
  }

  pub async fn refresh_at(&self, now_ms: i64) -> FetchedCatalog {
    let fetched = self.client.fetch_products().await;

    if let Err(e) = self.snapshots.write(&fetched.products, now_ms).await {
      tracing::warn!(error = %e, "failed to cache catalog snapshot");
    }

    fetched
  }

  /// Downscaled copies of the products' images for this session.
  ///
  /// The snapshot keeps the original URLs; the local files do not outlive
  /// the process.
  pub async fn shrink_images(&self, products: &[Product]) -> Vec<ImageReplacement> {
    match &self.shrinker {
      Some(shrinker) => {
        let replaced = shrinker.shrink_all(products).await;
        tracing::debug!(replaced = replaced.len(), "downscaled product images");
        replaced
      }
      None => Vec::new(),
    }
  }
}
