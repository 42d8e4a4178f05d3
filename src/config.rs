use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub store: StoreConfig,
  #[serde(default)]
  pub catalog: CatalogConfig,
  #[serde(default)]
  pub images: ImageConfig,
  #[serde(default)]
  pub shell: ShellConfig,
}

/// Storefront identity and checkout destination
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
  #[serde(default = "default_title")]
  pub title: String,
  /// Destination phone number for checkout messages (digits, international format)
  #[serde(default)]
  pub phone: Option<String>,
  /// Host of the messaging deep link, e.g. "wa.me"
  #[serde(default = "default_messaging_host")]
  pub messaging_host: String,
  #[serde(default)]
  pub currency: CurrencyConfig,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      title: default_title(),
      phone: None,
      messaging_host: default_messaging_host(),
      currency: CurrencyConfig::default(),
    }
  }
}

fn default_title() -> String {
  "Gn Store".to_string()
}

fn default_messaging_host() -> String {
  "wa.me".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyConfig {
  #[serde(default = "default_currency_code")]
  pub code: String,
  #[serde(default)]
  pub fraction_digits: u8,
}

impl Default for CurrencyConfig {
  fn default() -> Self {
    Self {
      code: default_currency_code(),
      fraction_digits: 0,
    }
  }
}

fn default_currency_code() -> String {
  "IQD".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
  /// Published CSV export of the products sheet
  #[serde(default)]
  pub csv_url: Option<String>,
  #[serde(default)]
  pub sheets: SheetsConfig,
  /// Age after which a cached snapshot is not painted on startup
  #[serde(default = "default_cache_ttl_secs")]
  pub cache_ttl_secs: u64,
}

impl Default for CatalogConfig {
  fn default() -> Self {
    Self {
      csv_url: None,
      sheets: SheetsConfig::default(),
      cache_ttl_secs: default_cache_ttl_secs(),
    }
  }
}

fn default_cache_ttl_secs() -> u64 {
  600
}

/// Spreadsheet values API source. The API key comes from the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct SheetsConfig {
  #[serde(default)]
  pub enabled: bool,
  #[serde(default)]
  pub sheet_id: Option<String>,
  #[serde(default = "default_sheet_range")]
  pub range: String,
}

impl Default for SheetsConfig {
  fn default() -> Self {
    Self {
      enabled: false,
      sheet_id: None,
      range: default_sheet_range(),
    }
  }
}

fn default_sheet_range() -> String {
  "Products".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
  #[serde(default = "default_true")]
  pub enabled: bool,
  #[serde(default = "default_max_width")]
  pub max_width: u32,
  /// Budget for each image download
  #[serde(default = "default_image_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ImageConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      max_width: default_max_width(),
      timeout_secs: default_image_timeout_secs(),
    }
  }
}

fn default_image_timeout_secs() -> u64 {
  5
}

fn default_true() -> bool {
  true
}

fn default_max_width() -> u32 {
  800
}

/// Offline shell of the web storefront
#[derive(Debug, Clone, Deserialize)]
pub struct ShellConfig {
  /// Origin the shell assets are fetched from, e.g. "https://shop.example.com"
  #[serde(default)]
  pub origin: Option<String>,
  /// Bump to invalidate previously installed shell caches
  #[serde(default = "default_shell_version")]
  pub version: String,
}

impl Default for ShellConfig {
  fn default() -> Self {
    Self {
      origin: None,
      version: default_shell_version(),
    }
  }
}

fn default_shell_version() -> String {
  "v1".to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./gnstore.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/gnstore/config.yaml
  ///
  /// Without any file the built-in defaults apply, which serve the demo catalog.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => {
        tracing::info!("no config file found, using defaults");
        Ok(Config::default())
      }
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("gnstore.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("gnstore").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn parse(contents: &str) -> Result<Self> {
    // An empty file deserializes to null rather than an empty mapping
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  /// Get the spreadsheet API key from environment variables.
  ///
  /// Checks GNSTORE_SHEETS_API_KEY first, then GOOGLE_API_KEY as fallback.
  pub fn sheets_api_key() -> Option<String> {
    std::env::var("GNSTORE_SHEETS_API_KEY")
      .or_else(|_| std::env::var("GOOGLE_API_KEY"))
      .ok()
      .filter(|k| !k.trim().is_empty())
  }

  /// Cache TTL in milliseconds
  pub fn cache_ttl_ms(&self) -> i64 {
    (self.catalog.cache_ttl_secs as i64).saturating_mul(1000)
  }

  /// Directory for the local store and log files
  pub fn data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("gnstore"))
  }
}
