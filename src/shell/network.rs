use color_eyre::{eyre::eyre, Result};
use reqwest::{header::CONTENT_TYPE, Method};

use super::{AssetNetwork, AssetResponse, ShellRequest};

/// Live network for the shell
#[derive(Clone)]
pub struct HttpNetwork {
  http: reqwest::Client,
}

impl HttpNetwork {
  pub fn new(http: reqwest::Client) -> Self {
    Self { http }
  }
}

impl AssetNetwork for HttpNetwork {
  async fn send(&self, request: &ShellRequest) -> Result<AssetResponse> {
    let url = &request.url;
    let method = Method::from_bytes(request.method.as_bytes())
      .map_err(|e| eyre!("Invalid method {}: {}", request.method, e))?;
    let response = self
      .http
      .request(method, url.clone())
      .send()
      .await
      .map_err(|e| eyre!("Request to {} failed: {}", url, e))?;

    let status = response.status().as_u16();
    let content_type = response
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(str::to_string);
    let body = response
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read body from {}: {}", url, e))?
      .to_vec();

    Ok(AssetResponse {
      status,
      content_type,
      body,
    })
  }
}
