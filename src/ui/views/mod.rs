mod cart;
mod catalog;
mod product_detail;

pub use cart::CartView;
pub use catalog::CatalogView;
pub use product_detail::ProductDetailView;
