use serde::{Deserialize, Serialize};

/// Category assigned to products whose row leaves the category blank
pub const DEFAULT_CATEGORY: &str = "general";

/// Title assigned to products whose row has neither a title nor a name
pub const DEFAULT_TITLE: &str = "Product";

/// A catalog product as fetched from one of the catalog sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id: String,
  pub title: String,
  pub price: f64,
  pub category: String,
  #[serde(default)]
  pub brand: String,
  /// Remote URL, or a `file://` URL once the image has been downscaled locally
  #[serde(default)]
  pub image: String,
  #[serde(default)]
  pub description: String,
  /// Units available; 0 means the product cannot be bought
  #[serde(default)]
  pub stock: u32,
  #[serde(default)]
  pub created_at: String,
}

impl Product {
  pub fn in_stock(&self) -> bool {
    self.stock > 0
  }
}

/// Where a catalog snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
  /// Spreadsheet values API
  Sheets,
  /// Published CSV export
  Csv,
  /// Built-in demo list, either by configuration or after a failed fetch
  Demo,
  /// Last snapshot from the local cache
  Cache,
}

impl CatalogSource {
  pub fn label(&self) -> &'static str {
    match self {
      CatalogSource::Sheets => "sheets",
      CatalogSource::Csv => "csv",
      CatalogSource::Demo => "demo",
      CatalogSource::Cache => "cache",
    }
  }
}

/// Products from one fetch cycle along with their origin
#[derive(Debug, Clone)]
pub struct FetchedCatalog {
  pub products: Vec<Product>,
  pub source: CatalogSource,
}

/// Parse a price cell by dropping everything except digits and dots.
///
/// "IQD 12,500" becomes 12500.0. Unparsable or negative input yields 0.
pub fn parse_price(raw: &str) -> f64 {
  let cleaned: String = raw
    .chars()
    .filter(|c| c.is_ascii_digit() || *c == '.')
    .collect();

  parse_leading_float(&cleaned)
}

/// Parse the longest numeric prefix, so "1.2.3" reads as 1.2
fn parse_leading_float(s: &str) -> f64 {
  let mut end = 0;
  let mut seen_dot = false;
  for (i, c) in s.char_indices() {
    if c == '.' {
      if seen_dot {
        break;
      }
      seen_dot = true;
    }
    end = i + c.len_utf8();
  }

  match s[..end].parse::<f64>() {
    Ok(v) if v.is_finite() && v >= 0.0 => v,
    _ => 0.0,
  }
}

/// Parse a stock cell from its leading integer. Anything else yields 0.
pub fn parse_stock(raw: &str) -> u32 {
  let trimmed = raw.trim();
  let (negative, digits) = match trimmed.strip_prefix('-') {
    Some(rest) => (true, rest),
    None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
  };

  let end = digits
    .char_indices()
    .find(|(_, c)| !c.is_ascii_digit())
    .map(|(i, _)| i)
    .unwrap_or(digits.len());

  if negative {
    return 0;
  }

  digits[..end].parse::<u32>().unwrap_or(0)
}
