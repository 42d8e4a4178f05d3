//! Best-effort image downscaling for catalog products.
//!
//! Each image is fetched, decoded, scaled to a bounded width and re-encoded as
//! JPEG into a temporary directory that lives as long as the shrinker. The
//! pass runs after the catalog is already on screen and reports replacements
//! for the caller to apply. Any failure leaves the original URL in place;
//! items never affect each other.

use crate::catalog::types::Product;
use color_eyre::{eyre::eyre, Result};
use futures::future::join_all;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;

const JPEG_QUALITY: u8 = 75;

/// Per-image request budget, much shorter than a catalog fetch
pub const DEFAULT_IMAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// A downscaled copy of one product's image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReplacement {
  pub id: String,
  /// Image reference the copy was made from
  pub source: String,
  /// `file://` URL of the local copy
  pub local: String,
}

/// Downscales product images into a session-scoped directory
#[derive(Clone)]
pub struct ImageShrinker {
  http: reqwest::Client,
  max_width: u32,
  timeout: Duration,
  dir: Arc<TempDir>,
}

impl ImageShrinker {
  pub fn new(http: reqwest::Client, max_width: u32) -> Result<Self> {
    let dir = tempfile::Builder::new()
      .prefix("gnstore-images-")
      .tempdir()
      .map_err(|e| eyre!("Failed to create image directory: {}", e))?;

    Ok(Self {
      http,
      max_width: max_width.max(1),
      timeout: DEFAULT_IMAGE_TIMEOUT,
      dir: Arc::new(dir),
    })
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  /// Shrink every remote image concurrently.
  ///
  /// Returns one replacement per image that made it; the rest keep their URL.
  pub async fn shrink_all(&self, products: &[Product]) -> Vec<ImageReplacement> {
    let jobs = products
      .iter()
      .filter(|p| is_remote(&p.image))
      .map(|p| async move {
        match self.shrink(&p.image).await {
          Ok(local) => Some(ImageReplacement {
            id: p.id.clone(),
            source: p.image.clone(),
            local,
          }),
          Err(e) => {
            tracing::debug!(image = %p.image, error = %e, "keeping original image");
            None
          }
        }
      });

    join_all(jobs).await.into_iter().flatten().collect()
  }

  async fn shrink(&self, source: &str) -> Result<String> {
    let response = self
      .http
      .get(source)
      .timeout(self.timeout)
      .send()
      .await?
      .error_for_status()?;
    let bytes = response.bytes().await?;

    let target = self.dir.path().join(file_name_for(source));
    let max_width = self.max_width;
    let out = target.clone();
    tokio::task::spawn_blocking(move || downscale_to_file(&bytes, max_width, &out))
      .await
      .map_err(|e| eyre!("Image task failed: {}", e))??;

    file_url(&target)
  }
}

fn is_remote(image: &str) -> bool {
  image.starts_with("http://") || image.starts_with("https://")
}

/// Stable file name for a source URL
fn file_name_for(source: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(source.as_bytes());
  format!("{}.jpg", hex::encode(hasher.finalize()))
}

fn file_url(path: &Path) -> Result<String> {
  Url::from_file_path(path)
    .map(String::from)
    .map_err(|_| eyre!("Not an absolute path: {}", path.display()))
}

/// Target dimensions for a width bound, never upscaling
pub fn scaled_size(width: u32, height: u32, max_width: u32) -> (u32, u32) {
  if width <= max_width || width == 0 {
    return (width, height);
  }
  let ratio = max_width as f64 / width as f64;
  let new_height = ((height as f64) * ratio).round().max(1.0) as u32;
  (max_width, new_height)
}

/// Decode an encoded image, scale it, and write it as JPEG
pub fn downscale_to_file(bytes: &[u8], max_width: u32, target: &Path) -> Result<()> {
  let img = image::load_from_memory(bytes)?;
  let (w, h) = scaled_size(img.width(), img.height(), max_width);
  let img = if (w, h) == (img.width(), img.height()) {
    img
  } else {
    img.resize_exact(w, h, FilterType::Triangle)
  };

  let file = std::fs::File::create(target)?;
  let mut writer = std::io::BufWriter::new(file);
  let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
  // JPEG has no alpha channel
  img.to_rgb8().write_with_encoder(encoder)?;
  Ok(())
}
