//! Derivation of the visible catalog from raw products and filter state.
//!
//! Everything here is pure and re-run on every change. Catalogs are small,
//! so a linear scan followed by a stable sort is all that is needed.

use crate::catalog::Product;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;

/// Category value meaning "no category filter"
pub const ALL_CATEGORIES: &str = "all";

/// Sort order applied after filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
  /// Keep fetch order
  #[default]
  Relevance,
  PriceAsc,
  PriceDesc,
  /// Most recently created first
  Newest,
}

impl SortKey {
  pub fn label(&self) -> &'static str {
    match self {
      SortKey::Relevance => "relevance",
      SortKey::PriceAsc => "price: low to high",
      SortKey::PriceDesc => "price: high to low",
      SortKey::Newest => "newest",
    }
  }

  /// Next key in the cycle used by the sort shortcut
  pub fn next(self) -> Self {
    match self {
      SortKey::Relevance => SortKey::PriceAsc,
      SortKey::PriceAsc => SortKey::PriceDesc,
      SortKey::PriceDesc => SortKey::Newest,
      SortKey::Newest => SortKey::Relevance,
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().as_str() {
      "relevance" | "none" => Some(SortKey::Relevance),
      "price_asc" | "asc" | "cheap" => Some(SortKey::PriceAsc),
      "price_desc" | "desc" => Some(SortKey::PriceDesc),
      "newest" | "new" => Some(SortKey::Newest),
      _ => None,
    }
  }
}

/// Active catalog filters; owned by the view layer, never persisted
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
  pub category: String,
  pub brand: Option<String>,
  pub query: String,
  pub min_price: Option<f64>,
  pub max_price: Option<f64>,
  pub in_stock_only: bool,
  pub sort: SortKey,
}

impl Default for FilterState {
  fn default() -> Self {
    Self {
      category: ALL_CATEGORIES.to_string(),
      brand: None,
      query: String::new(),
      min_price: None,
      max_price: None,
      in_stock_only: false,
      sort: SortKey::Relevance,
    }
  }
}

impl FilterState {
  /// Parse a user-typed price bound; blank or invalid input clears the bound
  pub fn parse_price(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
  }

  /// True when `product` passes every active predicate
  pub fn matches(&self, product: &Product) -> bool {
    if self.category != ALL_CATEGORIES
      && product.category.to_lowercase() != self.category.to_lowercase()
    {
      return false;
    }
    if let Some(brand) = &self.brand {
      if product.brand.to_lowercase() != brand.to_lowercase() {
        return false;
      }
    }
    if self.in_stock_only && !product.in_stock() {
      return false;
    }
    if !self.query.is_empty() {
      let haystack = format!("{} {}", product.title, product.description).to_lowercase();
      if !haystack.contains(&self.query.to_lowercase()) {
        return false;
      }
    }
    if let Some(min) = self.min_price {
      if product.price < min {
        return false;
      }
    }
    if let Some(max) = self.max_price {
      if product.price > max {
        return false;
      }
    }
    true
  }

  /// Number of active predicates, for the status line
  pub fn active_count(&self) -> usize {
    [
      self.category != ALL_CATEGORIES,
      self.brand.is_some(),
      self.in_stock_only,
      !self.query.is_empty(),
      self.min_price.is_some(),
      self.max_price.is_some(),
    ]
    .iter()
    .filter(|active| **active)
    .count()
  }
}

/// Filter then sort; `Relevance` preserves the input order
pub fn visible_products<'a>(products: &'a [Product], filters: &FilterState) -> Vec<&'a Product> {
  let mut visible: Vec<&Product> = products.iter().filter(|p| filters.matches(p)).collect();

  match filters.sort {
    SortKey::Relevance => {}
    SortKey::PriceAsc => visible.sort_by(|a, b| cmp_price(a.price, b.price)),
    SortKey::PriceDesc => visible.sort_by(|a, b| cmp_price(b.price, a.price)),
    SortKey::Newest => visible.sort_by_key(|p| std::cmp::Reverse(created_millis(&p.created_at))),
  }

  visible
}

fn cmp_price(a: f64, b: f64) -> Ordering {
  a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Creation time in epoch milliseconds; anything unparsable counts as the epoch
pub fn created_millis(raw: &str) -> i64 {
  let raw = raw.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return dt.timestamp_millis();
  }
  if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
    return dt.and_utc().timestamp_millis();
  }
  if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
    return dt.and_utc().timestamp_millis();
  }
  if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
    if let Some(dt) = date.and_hms_opt(0, 0, 0) {
      return dt.and_utc().timestamp_millis();
    }
  }
  0
}

/// "all" followed by each category in first-seen order
pub fn categories(products: &[Product]) -> Vec<String> {
  let mut out = vec![ALL_CATEGORIES.to_string()];
  for p in products {
    if !out.iter().any(|c| c == &p.category) {
      out.push(p.category.clone());
    }
  }
  out
}

/// Distinct non-empty brands in first-seen order
pub fn brands(products: &[Product]) -> Vec<String> {
  let mut out: Vec<String> = Vec::new();
  for p in products {
    if !p.brand.is_empty() && !out.contains(&p.brand) {
      out.push(p.brand.clone());
    }
  }
  out
}
