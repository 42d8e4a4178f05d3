//! Application state and its transitions.
//!
//! The view layer owns one `AppState` and feeds it `Action`s. `apply` is a
//! pure transition: side effects (persistence, opening links) come back as
//! `Effect`s for the caller to run.

use crate::cart::{AddOutcome, Cart};
use crate::catalog::{CatalogSource, ImageReplacement, Product};
use crate::checkout;
use crate::config::StoreConfig;
use crate::filters::{self, FilterState, SortKey};
use crate::route::Route;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
  #[default]
  Light,
  Dark,
}

impl Theme {
  pub fn toggled(self) -> Self {
    match self {
      Theme::Light => Theme::Dark,
      Theme::Dark => Theme::Light,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
  Info,
  Error,
}

/// Message shown in the status bar until the next action replaces it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub kind: NoticeKind,
  pub text: String,
}

impl Notice {
  fn info(text: impl Into<String>) -> Self {
    Self {
      kind: NoticeKind::Info,
      text: text.into(),
    }
  }

  fn error(text: impl Into<String>) -> Self {
    Self {
      kind: NoticeKind::Error,
      text: text.into(),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
  /// A remote refresh has started
  LoadStarted,
  /// A product list arrived; replaces the current one wholesale
  CatalogLoaded {
    products: Vec<Product>,
    source: CatalogSource,
  },
  /// The refresh task died without producing a list
  LoadFailed(String),
  /// Downscaled images finished after the list was shown
  ImagesReplaced(Vec<ImageReplacement>),
  SetCategory(String),
  SetBrand(Option<String>),
  SetQuery(String),
  SetMinPrice(Option<f64>),
  SetMaxPrice(Option<f64>),
  ToggleInStock,
  SetSort(SortKey),
  ResetFilters,
  AddToCart { id: String, qty: u32 },
  SetQuantity { id: String, qty: u32 },
  ClearCart,
  Navigate(Route),
  ToggleTheme,
  Checkout,
  /// Surface a failure from outside the state machine
  ReportError(String),
  DismissNotice,
}

/// Side effects requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
  PersistCart(Cart),
  PersistTheme(Theme),
  OpenLink(Url),
}

#[derive(Debug, Clone)]
pub struct AppState {
  store: StoreConfig,
  pub products: Vec<Product>,
  pub source: Option<CatalogSource>,
  /// Nothing to show yet
  pub loading: bool,
  /// Remote fetch in flight
  pub refreshing: bool,
  pub filters: FilterState,
  pub cart: Cart,
  pub route: Route,
  pub theme: Theme,
  pub notice: Option<Notice>,
}

impl AppState {
  pub fn new(store: StoreConfig, cart: Cart, theme: Theme, route: Route) -> Self {
    Self {
      store,
      products: Vec::new(),
      source: None,
      loading: true,
      refreshing: false,
      filters: FilterState::default(),
      cart,
      route,
      theme,
      notice: None,
    }
  }

  pub fn store(&self) -> &StoreConfig {
    &self.store
  }

  pub fn apply(&mut self, action: Action) -> Vec<Effect> {
    match action {
      Action::LoadStarted => {
        self.refreshing = true;
        self.loading = self.products.is_empty();
        Vec::new()
      }
      Action::CatalogLoaded { products, source } => {
        tracing::debug!(count = products.len(), source = source.label(), "catalog replaced");
        self.products = products;
        self.source = Some(source);
        self.loading = false;
        if source != CatalogSource::Cache {
          self.refreshing = false;
        }
        Vec::new()
      }
      Action::LoadFailed(message) => {
        tracing::warn!(error = %message, "catalog refresh failed");
        self.refreshing = false;
        self.loading = false;
        self.notice = Some(Notice::error(format!("Could not refresh the catalog: {}", message)));
        Vec::new()
      }
      Action::ImagesReplaced(replacements) => {
        // The list may have been replaced since the pass started
        for r in replacements {
          if let Some(product) = self
            .products
            .iter_mut()
            .find(|p| p.id == r.id && p.image == r.source)
          {
            product.image = r.local;
          }
        }
        Vec::new()
      }
      Action::SetCategory(category) => {
        self.filters.category = category;
        Vec::new()
      }
      Action::SetBrand(brand) => {
        self.filters.brand = brand;
        Vec::new()
      }
      Action::SetQuery(query) => {
        self.filters.query = query;
        Vec::new()
      }
      Action::SetMinPrice(min) => {
        self.filters.min_price = min;
        Vec::new()
      }
      Action::SetMaxPrice(max) => {
        self.filters.max_price = max;
        Vec::new()
      }
      Action::ToggleInStock => {
        self.filters.in_stock_only = !self.filters.in_stock_only;
        Vec::new()
      }
      Action::SetSort(sort) => {
        self.filters.sort = sort;
        Vec::new()
      }
      Action::ResetFilters => {
        self.filters = FilterState::default();
        Vec::new()
      }
      Action::AddToCart { id, qty } => self.add_to_cart(&id, qty),
      Action::SetQuantity { id, qty } => {
        if self.cart.set_quantity(&id, qty) {
          vec![Effect::PersistCart(self.cart.clone())]
        } else {
          Vec::new()
        }
      }
      Action::ClearCart => {
        self.cart.clear();
        self.notice = Some(Notice::info("Cart cleared"));
        vec![Effect::PersistCart(self.cart.clone())]
      }
      Action::Navigate(route) => {
        self.route = route;
        Vec::new()
      }
      Action::ToggleTheme => {
        self.theme = self.theme.toggled();
        vec![Effect::PersistTheme(self.theme)]
      }
      Action::Checkout => match checkout::checkout_link(&self.cart, &self.store) {
        Ok(url) => {
          self.notice = Some(Notice::info("Opening checkout link"));
          vec![Effect::OpenLink(url)]
        }
        Err(e) => {
          self.notice = Some(Notice::error(e.to_string()));
          Vec::new()
        }
      },
      Action::ReportError(message) => {
        self.notice = Some(Notice::error(message));
        Vec::new()
      }
      Action::DismissNotice => {
        self.notice = None;
        Vec::new()
      }
    }
  }

  fn add_to_cart(&mut self, id: &str, qty: u32) -> Vec<Effect> {
    let Some(product) = self.products.iter().find(|p| p.id == id) else {
      self.notice = Some(Notice::error(format!("Product {} is no longer available", id)));
      return Vec::new();
    };

    match self.cart.add(product, qty) {
      AddOutcome::OutOfStock => {
        self.notice = Some(Notice::error(format!("{} is out of stock", product.title)));
        Vec::new()
      }
      AddOutcome::Clamped { quantity } => {
        self.notice = Some(Notice::info(format!(
          "Only {} of {} in stock",
          quantity, product.title
        )));
        vec![Effect::PersistCart(self.cart.clone())]
      }
      AddOutcome::Added { quantity } => {
        self.notice = Some(Notice::info(format!(
          "{} in cart: {}",
          product.title, quantity
        )));
        vec![Effect::PersistCart(self.cart.clone())]
      }
    }
  }

  /// Products after filtering and sorting
  pub fn visible(&self) -> Vec<&Product> {
    filters::visible_products(&self.products, &self.filters)
  }

  pub fn categories(&self) -> Vec<String> {
    filters::categories(&self.products)
  }

  pub fn brands(&self) -> Vec<String> {
    filters::brands(&self.products)
  }

  /// Product named by the current route, if it is still in the catalog
  pub fn selected_product(&self) -> Option<&Product> {
    match &self.route {
      Route::ProductDetail(id) => self.products.iter().find(|p| &p.id == id),
      Route::Catalog => None,
    }
  }

  /// Order message for the cart preview
  pub fn order_message(&self) -> Option<String> {
    checkout::compose(&self.cart, &self.store)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::demo::demo_products;

  fn state_with_catalog() -> AppState {
    let mut state = AppState::new(
      StoreConfig {
        phone: Some("9647700000000".to_string()),
        ..StoreConfig::default()
      },
      Cart::new(),
      Theme::Light,
      Route::Catalog,
    );
    state.apply(Action::CatalogLoaded {
      products: demo_products(),
      source: CatalogSource::Demo,
    });
    state
  }

  #[test]
  fn test_cache_paint_keeps_refresh_flag() {
    let mut state = AppState::new(StoreConfig::default(), Cart::new(), Theme::Light, Route::Catalog);
    assert!(state.loading);

    state.apply(Action::LoadStarted);
    state.apply(Action::CatalogLoaded {
      products: demo_products(),
      source: CatalogSource::Cache,
    });
    assert!(!state.loading);
    assert!(state.refreshing);

    state.apply(Action::CatalogLoaded {
      products: demo_products()[..2].to_vec(),
      source: CatalogSource::Csv,
    });
    assert!(!state.refreshing);
    assert_eq!(state.products.len(), 2);
    assert_eq!(state.source, Some(CatalogSource::Csv));
  }

  #[test]
  fn test_load_failure_clears_flags() {
    let mut state = AppState::new(StoreConfig::default(), Cart::new(), Theme::Light, Route::Catalog);
    state.apply(Action::LoadStarted);
    state.apply(Action::LoadFailed("cancelled".to_string()));
    assert!(!state.loading);
    assert!(!state.refreshing);
    assert_eq!(state.notice.as_ref().map(|n| n.kind), Some(NoticeKind::Error));
  }

  #[test]
  fn test_add_to_cart_persists() {
    let mut state = state_with_catalog();
    let effects = state.apply(Action::AddToCart {
      id: "p1".to_string(),
      qty: 2,
    });

    assert_eq!(state.cart.quantity("p1"), 2);
    assert_eq!(effects, vec![Effect::PersistCart(state.cart.clone())]);
  }

  #[test]
  fn test_add_unknown_product_sets_error_notice() {
    let mut state = state_with_catalog();
    let effects = state.apply(Action::AddToCart {
      id: "ghost".to_string(),
      qty: 1,
    });
    assert!(effects.is_empty());
    assert_eq!(state.notice.as_ref().map(|n| n.kind), Some(NoticeKind::Error));
  }

  #[test]
  fn test_add_clamped_reports_stock() {
    let mut state = state_with_catalog();
    state.apply(Action::AddToCart {
      id: "p1".to_string(),
      qty: 50,
    });
    assert_eq!(state.cart.quantity("p1"), 10);
    assert!(state.notice.as_ref().unwrap().text.contains("Only 10"));
  }

  #[test]
  fn test_cart_survives_refresh_when_id_persists() {
    let mut state = state_with_catalog();
    state.apply(Action::AddToCart {
      id: "p2".to_string(),
      qty: 1,
    });
    state.apply(Action::CatalogLoaded {
      products: Vec::new(),
      source: CatalogSource::Csv,
    });
    assert_eq!(state.cart.quantity("p2"), 1);
  }

  #[test]
  fn test_set_quantity_and_clear() {
    let mut state = state_with_catalog();
    state.apply(Action::AddToCart {
      id: "p3".to_string(),
      qty: 3,
    });

    let effects = state.apply(Action::SetQuantity {
      id: "p3".to_string(),
      qty: 0,
    });
    assert_eq!(effects.len(), 1);
    assert!(state.cart.is_empty());

    let effects = state.apply(Action::SetQuantity {
      id: "p3".to_string(),
      qty: 2,
    });
    assert!(effects.is_empty());

    let effects = state.apply(Action::ClearCart);
    assert_eq!(effects, vec![Effect::PersistCart(Cart::new())]);
  }

  #[test]
  fn test_filters_drive_visible_products() {
    let mut state = state_with_catalog();
    state.apply(Action::SetSort(SortKey::PriceAsc));
    state.apply(Action::SetMaxPrice(Some(10.0)));
    let ids: Vec<&str> = state.visible().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["p3", "p2"]);

    state.apply(Action::ResetFilters);
    assert_eq!(state.visible().len(), 3);
  }

  #[test]
  fn test_route_selects_product() {
    let mut state = state_with_catalog();
    state.apply(Action::Navigate(Route::parse("#/product/p2")));
    assert_eq!(state.selected_product().map(|p| p.id.as_str()), Some("p2"));

    // Refresh without the id leaves the route pointing at nothing
    state.apply(Action::CatalogLoaded {
      products: demo_products()[..1].to_vec(),
      source: CatalogSource::Csv,
    });
    assert!(state.selected_product().is_none());
  }

  #[test]
  fn test_toggle_theme_persists() {
    let mut state = state_with_catalog();
    let effects = state.apply(Action::ToggleTheme);
    assert_eq!(state.theme, Theme::Dark);
    assert_eq!(effects, vec![Effect::PersistTheme(Theme::Dark)]);
  }

  #[test]
  fn test_checkout_empty_cart_alerts() {
    let mut state = state_with_catalog();
    let effects = state.apply(Action::Checkout);
    assert!(effects.is_empty());
    let notice = state.notice.clone().unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.text, "Your cart is empty");
  }

  #[test]
  fn test_checkout_opens_link() {
    let mut state = state_with_catalog();
    state.apply(Action::AddToCart {
      id: "p1".to_string(),
      qty: 1,
    });
    let effects = state.apply(Action::Checkout);
    match effects.as_slice() {
      [Effect::OpenLink(url)] => assert_eq!(url.path(), "/9647700000000"),
      other => panic!("unexpected effects: {:?}", other),
    }
  }

  #[test]
  fn test_image_replacements_skip_products_that_changed() {
    let mut state = state_with_catalog();
    let p1 = state.products[0].clone();
    let p2 = state.products[1].clone();

    state.apply(Action::ImagesReplaced(vec![
      ImageReplacement {
        id: p1.id.clone(),
        source: p1.image.clone(),
        local: "file:///tmp/p1.jpg".to_string(),
      },
      ImageReplacement {
        id: p2.id.clone(),
        source: "https://old.example/p2.png".to_string(),
        local: "file:///tmp/p2.jpg".to_string(),
      },
      ImageReplacement {
        id: "gone".to_string(),
        source: "https://old.example/gone.png".to_string(),
        local: "file:///tmp/gone.jpg".to_string(),
      },
    ]));

    assert_eq!(state.products[0].image, "file:///tmp/p1.jpg");
    assert_eq!(state.products[1].image, p2.image);
    assert_eq!(state.products.len(), 3);
  }
}
