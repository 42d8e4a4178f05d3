use crate::catalog::Product;
use crate::ui::theme::Palette;
use ratatui::prelude::Color;

/// Truncate to `max_len` characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Few enough left that the buyer should hurry
const LOW_STOCK: u32 = 5;

/// Stock text and its color
pub fn stock_label(product: &Product, palette: &Palette) -> (String, Color) {
  match product.stock {
    0 => ("Out of stock".to_string(), palette.error),
    n if n <= LOW_STOCK => (format!("Only {} left", n), palette.warn),
    n => (format!("In stock ({})", n), palette.ok),
  }
}
