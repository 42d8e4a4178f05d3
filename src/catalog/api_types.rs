//! Serde-deserializable types matching the spreadsheet values API.
//!
//! Kept apart from the domain types so the loose wire format (cells can be
//! strings, numbers or booleans) never leaks into `Product`.

use serde::Deserialize;
use serde_json::Value;

/// Response of `GET /v4/spreadsheets/{id}/values/{range}`
#[derive(Debug, Deserialize, Default)]
pub struct ApiValueRange {
  #[serde(default)]
  pub range: Option<String>,
  #[serde(default)]
  pub values: Vec<Vec<Value>>,
}

impl ApiValueRange {
  /// All rows with every cell rendered as text
  pub fn into_text_rows(self) -> Vec<Vec<String>> {
    self
      .values
      .into_iter()
      .map(|row| row.into_iter().map(cell_text).collect())
      .collect()
  }
}

fn cell_text(cell: Value) -> String {
  match cell {
    Value::Null => String::new(),
    Value::String(s) => s,
    other => other.to_string(),
  }
}
