//! Core traits and key names for the local store.

use color_eyre::Result;

/// Fixed keys of every persisted value
pub mod keys {
  /// Last fetched product list
  pub const PRODUCTS: &str = "gn_products_cache_v2";
  /// Fetch time of the product list, epoch milliseconds
  pub const PRODUCTS_TS: &str = "gn_products_cache_ts_v2";
  /// Cart lines keyed by product id
  pub const CART: &str = "gn_cart";
  /// Light or dark theme
  pub const THEME: &str = "gn_theme";
}

/// Synchronous string store, one serialized value per key.
///
/// Implementations report failures (full disk, poisoned lock, I/O) as errors
/// and never panic; callers decide whether a failure matters.
pub trait KeyValueStore: Send + Sync {
  /// Read the raw value stored under `key`
  fn get_raw(&self, key: &str) -> Result<Option<String>>;

  /// Replace the value stored under `key`
  fn set_raw(&self, key: &str, value: &str) -> Result<()>;
}
