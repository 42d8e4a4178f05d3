/// Screen the storefront shows, derived from a location string such as `#/product/p1`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Route {
  #[default]
  Catalog,
  ProductDetail(String),
}

const PRODUCT_PREFIX: &str = "/product/";

impl Route {
  /// Parse a hash location. Anything unrecognized is the catalog.
  pub fn parse(location: &str) -> Self {
    let path = location.trim();
    let path = path.strip_prefix('#').unwrap_or(path);

    match path.strip_prefix(PRODUCT_PREFIX) {
      Some(id) if !id.is_empty() && !id.contains('/') => Route::ProductDetail(id.to_string()),
      _ => Route::Catalog,
    }
  }

  /// Location string for this route
  pub fn location(&self) -> String {
    match self {
      Route::Catalog => "#/".to_string(),
      Route::ProductDetail(id) => format!("#{}{}", PRODUCT_PREFIX, id),
    }
  }
}
