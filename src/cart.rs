//! Shopping cart keyed by product id, persisted whole on every change.

use crate::cache::{keys, KeyValueStore, LocalCache};
use crate::catalog::Product;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One product in the cart with the quantity the buyer wants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
  pub id: String,
  pub title: String,
  pub price: f64,
  #[serde(default)]
  pub image: String,
  pub quantity: u32,
}

impl CartLine {
  fn from_product(product: &Product) -> Self {
    Self {
      id: product.id.clone(),
      title: product.title.clone(),
      price: product.price,
      image: product.image.clone(),
      quantity: 0,
    }
  }

  pub fn line_total(&self) -> f64 {
    self.price * self.quantity as f64
  }
}

/// Result of adding a product to the cart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
  /// Quantity increased by the full amount
  Added { quantity: u32 },
  /// Quantity stopped at the available stock
  Clamped { quantity: u32 },
  /// Product has no stock; the cart is unchanged
  OutOfStock,
}

/// Cart lines keyed by product id. No line ever has quantity 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
  lines: BTreeMap<String, CartLine>,
}

impl Cart {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add `qty` units of `product`, capped at its stock.
  ///
  /// Zero stock means unavailable, so nothing is added.
  pub fn add(&mut self, product: &Product, qty: u32) -> AddOutcome {
    if product.stock == 0 {
      return AddOutcome::OutOfStock;
    }
    if qty == 0 {
      let quantity = self.quantity(&product.id);
      return AddOutcome::Added { quantity };
    }

    let line = self
      .lines
      .entry(product.id.clone())
      .or_insert_with(|| CartLine::from_product(product));

    let wanted = line.quantity.saturating_add(qty);
    line.quantity = wanted.min(product.stock);

    if line.quantity < wanted {
      AddOutcome::Clamped {
        quantity: line.quantity,
      }
    } else {
      AddOutcome::Added {
        quantity: line.quantity,
      }
    }
  }

  /// Set a line's quantity verbatim; 0 removes the line.
  ///
  /// Returns false when there is no line for `id`.
  pub fn set_quantity(&mut self, id: &str, qty: u32) -> bool {
    if !self.lines.contains_key(id) {
      return false;
    }
    if qty == 0 {
      self.lines.remove(id);
    } else if let Some(line) = self.lines.get_mut(id) {
      line.quantity = qty;
    }
    true
  }

  pub fn clear(&mut self) {
    self.lines.clear();
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }

  /// Number of distinct lines
  pub fn item_count(&self) -> usize {
    self.lines.len()
  }

  /// Sum of quantities over all lines
  pub fn total_units(&self) -> u32 {
    self.lines.values().map(|l| l.quantity).sum()
  }

  pub fn quantity(&self, id: &str) -> u32 {
    self.lines.get(id).map(|l| l.quantity).unwrap_or(0)
  }

  pub fn get(&self, id: &str) -> Option<&CartLine> {
    self.lines.get(id)
  }

  pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
    self.lines.values()
  }

  pub fn subtotal(&self) -> f64 {
    self.lines.values().map(CartLine::line_total).sum()
  }

  /// Drop lines that can never be valid, e.g. zero quantities from an old blob
  fn normalized(mut self) -> Self {
    self.lines.retain(|_, line| line.quantity > 0);
    for (id, line) in self.lines.iter_mut() {
      if line.id.is_empty() {
        line.id = id.clone();
      }
    }
    self
  }
}

/// Restore the persisted cart; a missing or unreadable blob gives an empty cart
pub async fn load_cart<S: KeyValueStore>(cache: &LocalCache<S>) -> Cart {
  match cache.get::<Cart>(keys::CART).await {
    Ok(Some(cart)) => cart.normalized(),
    Ok(None) => Cart::new(),
    Err(e) => {
      tracing::warn!(error = %e, "discarding unreadable cart");
      Cart::new()
    }
  }
}

/// Write the whole cart under its fixed key
pub async fn save_cart<S: KeyValueStore>(
  cache: &LocalCache<S>,
  cart: &Cart,
) -> color_eyre::Result<()> {
  cache.set(keys::CART, cart).await
}
