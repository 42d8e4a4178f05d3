//! Order message composition and the messaging deep link used for checkout.

use crate::cart::Cart;
use crate::config::{CurrencyConfig, StoreConfig};
use num_format::{Locale, ToFormattedString};
use thiserror::Error;
use url::Url;

/// Reasons checkout cannot proceed; shown to the user as-is
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
  #[error("Your cart is empty")]
  EmptyCart,
  #[error("No checkout phone number is configured (store.phone)")]
  MissingPhone,
  #[error("Invalid messaging link: {0}")]
  InvalidLink(String),
}

/// Format an amount as "{CODE} {grouped amount}", e.g. "IQD 12,500"
pub fn format_currency(amount: f64, currency: &CurrencyConfig) -> String {
  let digits = currency.fraction_digits.min(6) as u32;
  let scale = 10u64.pow(digits);
  let amount = if amount.is_finite() { amount } else { 0.0 };

  // f64::round rounds half away from zero
  let scaled = (amount.abs() * scale as f64).round() as u64;
  let whole = (scaled / scale).to_formatted_string(&Locale::en);
  let sign = if amount < 0.0 && scaled > 0 { "-" } else { "" };

  if digits == 0 {
    format!("{} {}{}", currency.code, sign, whole)
  } else {
    let frac = scaled % scale;
    format!(
      "{} {}{}.{:0width$}",
      currency.code,
      sign,
      whole,
      frac,
      width = digits as usize
    )
  }
}

/// Render the cart as an order message, or `None` when there is nothing to send
pub fn compose(cart: &Cart, store: &StoreConfig) -> Option<String> {
  if cart.is_empty() {
    return None;
  }

  let mut lines = Vec::new();
  lines.push(format!("Order from {}", store.title));
  lines.push(String::new());
  for line in cart.lines() {
    lines.push(format!(
      "{} x {} — {} each",
      line.title,
      line.quantity,
      format_currency(line.price, &store.currency)
    ));
  }
  lines.push(String::new());
  lines.push(format!(
    "Total: {}",
    format_currency(cart.subtotal(), &store.currency)
  ));
  lines.push(String::new());
  lines.push("Name:".to_string());
  lines.push("Address:".to_string());
  lines.push("Phone:".to_string());

  Some(lines.join("\n"))
}

/// Build `https://{host}/{phone}?text={message}` for the current cart
pub fn checkout_link(cart: &Cart, store: &StoreConfig) -> Result<Url, CheckoutError> {
  let message = compose(cart, store).ok_or(CheckoutError::EmptyCart)?;

  let phone: String = store
    .phone
    .as_deref()
    .unwrap_or("")
    .chars()
    .filter(|c| c.is_ascii_digit())
    .collect();
  if phone.is_empty() {
    return Err(CheckoutError::MissingPhone);
  }

  let mut url = Url::parse(&format!("https://{}/", store.messaging_host.trim_matches('/')))
    .map_err(|e| CheckoutError::InvalidLink(e.to_string()))?;
  url.set_path(&phone);
  // Percent-encode like encodeURIComponent so spaces become %20, not '+'
  url.set_query(Some(&format!("text={}", urlencoding::encode(&message))));
  Ok(url)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::Product;

  fn product(id: &str, title: &str, price: f64) -> Product {
    Product {
      id: id.to_string(),
      title: title.to_string(),
      price,
      category: "general".to_string(),
      brand: String::new(),
      image: String::new(),
      description: String::new(),
      stock: 10,
      created_at: String::new(),
    }
  }

  fn usd() -> CurrencyConfig {
    CurrencyConfig {
      code: "USD".to_string(),
      fraction_digits: 2,
    }
  }

  fn store(phone: Option<&str>) -> StoreConfig {
    StoreConfig {
      phone: phone.map(str::to_string),
      currency: CurrencyConfig {
        code: "$".to_string(),
        fraction_digits: 0,
      },
      ..StoreConfig::default()
    }
  }

  fn sample_cart() -> Cart {
    let mut cart = Cart::new();
    cart.add(&product("p1", "Lamp", 10.0), 2);
    cart.add(&product("p2", "Bulb", 5.0), 1);
    cart
  }

  #[test]
  fn test_format_currency() {
    let iqd = CurrencyConfig::default();
    assert_eq!(format_currency(12500.0, &iqd), "IQD 12,500");
    assert_eq!(format_currency(29.99, &iqd), "IQD 30");
    assert_eq!(format_currency(0.5, &iqd), "IQD 1");
    assert_eq!(format_currency(1234567.891, &usd()), "USD 1,234,567.89");
    assert_eq!(format_currency(9.5, &usd()), "USD 9.50");
    assert_eq!(format_currency(-3.25, &usd()), "USD -3.25");
    assert_eq!(format_currency(f64::NAN, &usd()), "USD 0.00");
  }

  #[test]
  fn test_compose_empty_cart() {
    assert_eq!(compose(&Cart::new(), &store(Some("1"))), None);
  }

  #[test]
  fn test_compose_message_layout() {
    let message = compose(&sample_cart(), &store(Some("1"))).unwrap();
    let lines: Vec<&str> = message.lines().collect();

    assert_eq!(
      lines,
      vec![
        "Order from Gn Store",
        "",
        "Lamp x 2 — $ 10 each",
        "Bulb x 1 — $ 5 each",
        "",
        "Total: $ 25",
        "",
        "Name:",
        "Address:",
        "Phone:",
      ]
    );
  }

  #[test]
  fn test_compose_mentions_every_line() {
    let message = compose(&sample_cart(), &store(None)).unwrap();
    for line in sample_cart().lines() {
      assert!(message.contains(&line.title));
      assert!(message.contains(&format!("x {}", line.quantity)));
    }
    assert_eq!(message.matches(" each").count(), 2);
    assert_eq!(message.matches("Total:").count(), 1);
  }

  #[test]
  fn test_checkout_link() {
    let url = checkout_link(&sample_cart(), &store(Some("+964 770 740 9507"))).unwrap();

    assert_eq!(url.host_str(), Some("wa.me"));
    assert_eq!(url.path(), "/9647707409507");
    let query = url.query().unwrap();
    assert!(query.starts_with("text=Order%20from%20Gn%20Store%0A"));
    assert!(!query.contains('+'));

    let (key, text) = url.query_pairs().next().unwrap();
    assert_eq!(key, "text");
    assert_eq!(text, compose(&sample_cart(), &store(None)).unwrap());
  }

  #[test]
  fn test_checkout_requires_items_then_phone() {
    assert_eq!(
      checkout_link(&Cart::new(), &store(None)),
      Err(CheckoutError::EmptyCart)
    );
    assert_eq!(
      checkout_link(&sample_cart(), &store(None)),
      Err(CheckoutError::MissingPhone)
    );
    assert_eq!(
      checkout_link(&sample_cart(), &store(Some("  "))),
      Err(CheckoutError::MissingPhone)
    );
  }
}
