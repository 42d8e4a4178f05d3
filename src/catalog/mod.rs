//! Product catalog: domain types, source adapters and image post-processing.

pub mod api_types;
pub mod client;
pub mod demo;
pub mod images;
pub mod rows;
#[cfg(test)]
pub mod testing;
pub mod types;

pub use client::CatalogClient;
pub use images::{ImageReplacement, ImageShrinker};
pub use types::{CatalogSource, FetchedCatalog, Product};
