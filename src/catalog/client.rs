use crate::catalog::api_types::ApiValueRange;
use crate::catalog::demo::demo_products;
use crate::catalog::rows::{parse_csv, parse_table};
use crate::catalog::types::{CatalogSource, FetchedCatalog, Product};
use crate::config::Config;
use color_eyre::{eyre::eyre, Result};
use std::time::Duration;
use url::Url;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Which remote source the client will query, resolved once from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePlan {
  Sheets {
    sheet_id: String,
    range: String,
    api_key: String,
  },
  Csv {
    url: String,
  },
  Demo,
}

impl SourcePlan {
  /// Pick a source in fixed order: values API, then CSV export, then demo data.
  pub fn resolve(config: &Config, api_key: Option<String>) -> Self {
    let sheets = &config.catalog.sheets;
    let sheet_id = sheets.sheet_id.as_deref().filter(|id| !id.trim().is_empty());

    if let (true, Some(sheet_id), Some(api_key)) = (sheets.enabled, sheet_id, api_key) {
      return SourcePlan::Sheets {
        sheet_id: sheet_id.to_string(),
        range: sheets.range.clone(),
        api_key,
      };
    }

    match config.catalog.csv_url.as_deref().map(str::trim) {
      Some(url) if !url.is_empty() => SourcePlan::Csv {
        url: url.to_string(),
      },
      _ => SourcePlan::Demo,
    }
  }

  pub fn source(&self) -> CatalogSource {
    match self {
      SourcePlan::Sheets { .. } => CatalogSource::Sheets,
      SourcePlan::Csv { .. } => CatalogSource::Csv,
      SourcePlan::Demo => CatalogSource::Demo,
    }
  }
}

/// Catalog fetcher for the configured product source
#[derive(Clone)]
pub struct CatalogClient {
  http: reqwest::Client,
  plan: SourcePlan,
}

impl CatalogClient {
  pub fn new(config: &Config) -> Result<Self> {
    let plan = SourcePlan::resolve(config, Config::sheets_api_key());
    Self::with_plan(plan)
  }

  pub fn with_plan(plan: SourcePlan) -> Result<Self> {
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, plan })
  }

  pub fn plan(&self) -> &SourcePlan {
    &self.plan
  }

  /// Shared HTTP client, reused for image downloads
  pub fn http(&self) -> &reqwest::Client {
    &self.http
  }

  /// Fetch the catalog. Never fails: any error falls back to the demo products.
  pub async fn fetch_products(&self) -> FetchedCatalog {
    match self.try_fetch().await {
      Ok(products) => FetchedCatalog {
        products,
        source: self.plan.source(),
      },
      Err(e) => {
        tracing::warn!(error = %e, "catalog fetch failed, serving demo products");
        FetchedCatalog {
          products: demo_products(),
          source: CatalogSource::Demo,
        }
      }
    }
  }

  async fn try_fetch(&self) -> Result<Vec<Product>> {
    match &self.plan {
      SourcePlan::Sheets {
        sheet_id,
        range,
        api_key,
      } => {
        let url = sheets_values_url(sheet_id, range, api_key)?;
        let body = self.get_text(url.as_str()).await?;
        let response: ApiValueRange = serde_json::from_str(&body)
          .map_err(|e| eyre!("Failed to parse values response: {}", e))?;
        let products = parse_table(&response.into_text_rows());
        tracing::info!(count = products.len(), "loaded products from sheets api");
        Ok(products)
      }
      SourcePlan::Csv { url } => {
        let body = self.get_text(url).await?;
        let products = parse_csv(&body);
        tracing::info!(count = products.len(), "loaded products from csv export");
        Ok(products)
      }
      SourcePlan::Demo => Ok(demo_products()),
    }
  }

  async fn get_text(&self, url: &str) -> Result<String> {
    let response = self
      .http
      .get(url)
      .send()
      .await
      .map_err(|e| eyre!("Request to {} failed: {}", redact(url), e))?;

    let status = response.status();
    if !status.is_success() {
      return Err(eyre!("Request to {} returned {}", redact(url), status));
    }

    response
      .text()
      .await
      .map_err(|e| eyre!("Failed to read response body: {}", e))
  }
}

/// Build the values endpoint URL, escaping the sheet id and range as path segments
fn sheets_values_url(sheet_id: &str, range: &str, api_key: &str) -> Result<Url> {
  let mut url = Url::parse(SHEETS_API_BASE)?;
  url
    .path_segments_mut()
    .map_err(|_| eyre!("Sheets API base URL cannot have path segments"))?
    .extend([sheet_id, "values", range]);
  url.query_pairs_mut().append_pair("key", api_key);
  Ok(url)
}

/// Strip the query string so API keys never reach the log
fn redact(url: &str) -> &str {
  url.split('?').next().unwrap_or(url)
}
