//! Offline shell for the web storefront.
//!
//! A request-intercepting cache in the style of a service worker: `install`
//! pre-caches the shell documents into a versioned cache, `activate` evicts
//! caches left behind by older versions and takes control, and `fetch` serves
//! GET requests cache-first with an offline fallback document.

mod network;
mod storage;

pub use network::HttpNetwork;

use color_eyre::{eyre::eyre, Result};
use std::future::Future;
use url::Url;

/// Fallback document served when both cache and network miss
pub const OFFLINE_PATH: &str = "/offline.html";

/// Documents stored during install
pub const PRECACHE_PATHS: [&str; 3] = ["/", "/index.html", OFFLINE_PATH];

const CACHE_PREFIX: &str = "gnstore-shell-";

/// A stored or fetched response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
  pub status: u16,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
}

impl AssetResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// An intercepted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellRequest {
  pub method: String,
  pub url: Url,
}

impl ShellRequest {
  pub fn get(url: Url) -> Self {
    Self {
      method: "GET".to_string(),
      url,
    }
  }
}

/// Named response caches
pub trait AssetCache: Send + Sync {
  /// Names of every cache that exists
  fn cache_names(&self) -> Result<Vec<String>>;

  /// Create the cache if it does not exist yet
  fn open(&self, cache_name: &str) -> Result<()>;

  /// Stored response for `url` in `cache_name`
  fn lookup(&self, cache_name: &str, url: &str) -> Result<Option<AssetResponse>>;

  fn put(&self, cache_name: &str, url: &str, response: &AssetResponse) -> Result<()>;

  /// Delete a cache and everything in it; returns whether it existed
  fn delete(&self, cache_name: &str) -> Result<bool>;

  /// Cache of the shell that currently controls requests
  fn active(&self) -> Result<Option<String>>;

  fn set_active(&self, cache_name: &str) -> Result<()>;
}

/// Network side of the shell
pub trait AssetNetwork: Send + Sync {
  fn send(&self, request: &ShellRequest) -> impl Future<Output = Result<AssetResponse>> + Send;
}

/// Installation lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
  Idle,
  /// Pre-cache complete; waiting is skipped so activation may follow at once
  Installed,
  /// Controlling requests
  Active,
}

/// How a fetch was answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
  /// Not intercepted (non-GET, or shell not active); the network answered directly
  Passthrough(Result<AssetResponse, String>),
  FromCache(AssetResponse),
  FromNetwork(AssetResponse),
  /// Network failed; the offline document was served
  Fallback(AssetResponse),
  /// Network failed and no offline document is cached
  Unavailable(String),
}

impl FetchOutcome {
  pub fn response(&self) -> Option<&AssetResponse> {
    match self {
      FetchOutcome::Passthrough(Ok(r))
      | FetchOutcome::FromCache(r)
      | FetchOutcome::FromNetwork(r)
      | FetchOutcome::Fallback(r) => Some(r),
      FetchOutcome::Passthrough(Err(_)) | FetchOutcome::Unavailable(_) => None,
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      FetchOutcome::Passthrough(_) => "passthrough",
      FetchOutcome::FromCache(_) => "cache",
      FetchOutcome::FromNetwork(_) => "network",
      FetchOutcome::Fallback(_) => "offline fallback",
      FetchOutcome::Unavailable(_) => "unavailable",
    }
  }
}

/// Name of the cache for a shell version
pub fn cache_name_for(version: &str) -> String {
  format!("{}{}", CACHE_PREFIX, version)
}

pub struct OfflineShell<C: AssetCache, N: AssetNetwork> {
  cache: C,
  network: N,
  origin: Url,
  cache_name: String,
  state: ShellState,
  skip_waiting: bool,
  clients_claimed: bool,
}

impl<C: AssetCache, N: AssetNetwork> OfflineShell<C, N> {
  pub fn new(cache: C, network: N, origin: Url, version: &str) -> Self {
    Self {
      cache,
      network,
      origin,
      cache_name: cache_name_for(version),
      state: ShellState::Idle,
      skip_waiting: false,
      clients_claimed: false,
    }
  }

  /// Pick up where an earlier run left off
  pub fn resume(cache: C, network: N, origin: Url, version: &str) -> Result<Self> {
    let mut shell = Self::new(cache, network, origin, version);
    if shell.cache.active()?.as_deref() == Some(shell.cache_name.as_str()) {
      shell.state = ShellState::Active;
      shell.clients_claimed = true;
    } else if shell.cache.cache_names()?.contains(&shell.cache_name) {
      shell.state = ShellState::Installed;
      shell.skip_waiting = true;
    }
    Ok(shell)
  }

  pub fn state(&self) -> ShellState {
    self.state
  }

  pub fn cache_name(&self) -> &str {
    &self.cache_name
  }

  pub fn skip_waiting(&self) -> bool {
    self.skip_waiting
  }

  pub fn clients_claimed(&self) -> bool {
    self.clients_claimed
  }

  pub fn cache(&self) -> &C {
    &self.cache
  }

  fn resolve(&self, path: &str) -> Result<Url> {
    self
      .origin
      .join(path)
      .map_err(|e| eyre!("Invalid shell path {}: {}", path, e))
  }

  /// Pre-cache every shell document. Any failure leaves the shell idle.
  pub async fn install(&mut self) -> Result<()> {
    let mut fetched = Vec::with_capacity(PRECACHE_PATHS.len());
    for path in PRECACHE_PATHS {
      let url = self.resolve(path)?;
      let response = self.network.send(&ShellRequest::get(url.clone())).await?;
      if !response.is_success() {
        return Err(eyre!("Pre-cache of {} returned {}", url, response.status));
      }
      fetched.push((url, response));
    }

    // Create and fill the cache only once every asset has arrived
    self.cache.open(&self.cache_name)?;
    for (url, response) in &fetched {
      self.cache.put(&self.cache_name, url.as_str(), response)?;
    }

    self.state = ShellState::Installed;
    self.skip_waiting = true;
    tracing::info!(cache = %self.cache_name, "offline shell installed");
    Ok(())
  }

  /// Evict caches from other versions and take control. Returns evicted names.
  pub fn activate(&mut self) -> Result<Vec<String>> {
    match self.state {
      ShellState::Installed => {}
      ShellState::Active => return Ok(Vec::new()),
      ShellState::Idle => return Err(eyre!("Offline shell must be installed before activation")),
    }

    let mut evicted = Vec::new();
    for name in self.cache.cache_names()? {
      if name != self.cache_name && self.cache.delete(&name)? {
        evicted.push(name);
      }
    }

    self.cache.set_active(&self.cache_name)?;
    self.clients_claimed = true;
    self.state = ShellState::Active;
    tracing::info!(cache = %self.cache_name, evicted = evicted.len(), "offline shell active");
    Ok(evicted)
  }

  /// Answer a request the way the shell would
  pub async fn fetch(&self, request: &ShellRequest) -> FetchOutcome {
    if !request.method.eq_ignore_ascii_case("GET") || self.state != ShellState::Active {
      let result = self.network.send(request).await.map_err(|e| e.to_string());
      return FetchOutcome::Passthrough(result);
    }

    let key = request.url.as_str();
    match self.cache.lookup(&self.cache_name, key) {
      Ok(Some(hit)) => return FetchOutcome::FromCache(hit),
      Ok(None) => {}
      Err(e) => tracing::debug!(error = %e, url = key, "shell cache lookup failed"),
    }

    match self.network.send(request).await {
      Ok(response) => {
        if response.is_success() {
          if let Err(e) = self.cache.put(&self.cache_name, key, &response) {
            tracing::debug!(error = %e, url = key, "could not store response");
          }
        }
        FetchOutcome::FromNetwork(response)
      }
      Err(network_error) => {
        let offline = self
          .resolve(OFFLINE_PATH)
          .ok()
          .and_then(|url| self.cache.lookup(&self.cache_name, url.as_str()).ok().flatten());
        match offline {
          Some(page) => FetchOutcome::Fallback(page),
          None => FetchOutcome::Unavailable(network_error.to_string()),
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::{BTreeMap, HashMap, HashSet};
  use std::sync::Mutex;

  #[derive(Default)]
  struct MemoryCache {
    caches: Mutex<BTreeMap<String, HashMap<String, AssetResponse>>>,
    active: Mutex<Option<String>>,
    fail_puts: bool,
  }

  impl AssetCache for MemoryCache {
    fn cache_names(&self) -> Result<Vec<String>> {
      Ok(self.caches.lock().unwrap().keys().cloned().collect())
    }

    fn open(&self, cache_name: &str) -> Result<()> {
      self
        .caches
        .lock()
        .unwrap()
        .entry(cache_name.to_string())
        .or_default();
      Ok(())
    }

    fn lookup(&self, cache_name: &str, url: &str) -> Result<Option<AssetResponse>> {
      Ok(
        self
          .caches
          .lock()
          .unwrap()
          .get(cache_name)
          .and_then(|c| c.get(url).cloned()),
      )
    }

    fn put(&self, cache_name: &str, url: &str, response: &AssetResponse) -> Result<()> {
      if self.fail_puts {
        return Err(eyre!("quota exceeded"));
      }
      self
        .caches
        .lock()
        .unwrap()
        .entry(cache_name.to_string())
        .or_default()
        .insert(url.to_string(), response.clone());
      Ok(())
    }

    fn delete(&self, cache_name: &str) -> Result<bool> {
      Ok(self.caches.lock().unwrap().remove(cache_name).is_some())
    }

    fn active(&self) -> Result<Option<String>> {
      Ok(self.active.lock().unwrap().clone())
    }

    fn set_active(&self, cache_name: &str) -> Result<()> {
      *self.active.lock().unwrap() = Some(cache_name.to_string());
      Ok(())
    }
  }

  /// Serves `<path>` bodies for known paths; everything fails while offline
  #[derive(Default)]
  struct FakeNetwork {
    offline: Mutex<bool>,
    missing: HashSet<String>,
    calls: Mutex<Vec<String>>,
  }

  impl FakeNetwork {
    fn go_offline(&self) {
      *self.offline.lock().unwrap() = true;
    }

    fn calls(&self) -> usize {
      self.calls.lock().unwrap().len()
    }
  }

  impl AssetNetwork for FakeNetwork {
    async fn send(&self, request: &ShellRequest) -> Result<AssetResponse> {
      let url = &request.url;
      self.calls.lock().unwrap().push(format!("{} {}", request.method, url));
      if *self.offline.lock().unwrap() {
        return Err(eyre!("network down"));
      }
      let status = if self.missing.contains(url.path()) { 404 } else { 200 };
      Ok(AssetResponse {
        status,
        content_type: Some("text/html".to_string()),
        body: format!("<{}>", url.path()).into_bytes(),
      })
    }
  }

  fn origin() -> Url {
    Url::parse("https://shop.example.com").unwrap()
  }

  fn shell(version: &str) -> OfflineShell<MemoryCache, FakeNetwork> {
    OfflineShell::new(MemoryCache::default(), FakeNetwork::default(), origin(), version)
  }

  fn get(path: &str) -> ShellRequest {
    ShellRequest::get(origin().join(path).unwrap())
  }

  #[tokio::test]
  async fn test_install_precaches_shell_documents() {
    let mut shell = shell("v1");
    shell.install().await.unwrap();

    assert_eq!(shell.state(), ShellState::Installed);
    assert!(shell.skip_waiting());
    for path in PRECACHE_PATHS {
      let url = origin().join(path).unwrap();
      assert!(shell.cache().lookup("gnstore-shell-v1", url.as_str()).unwrap().is_some());
    }
  }

  #[tokio::test]
  async fn test_install_fails_when_an_asset_is_missing() {
    let network = FakeNetwork {
      missing: HashSet::from(["/offline.html".to_string()]),
      ..Default::default()
    };
    let mut shell = OfflineShell::new(MemoryCache::default(), network, origin(), "v1");

    assert!(shell.install().await.is_err());
    assert_eq!(shell.state(), ShellState::Idle);
    let index = origin().join("/index.html").unwrap();
    assert!(shell.cache().lookup("gnstore-shell-v1", index.as_str()).unwrap().is_none());
  }

  #[tokio::test]
  async fn test_activate_requires_install() {
    let mut shell = shell("v1");
    assert!(shell.activate().is_err());
  }

  #[tokio::test]
  async fn test_activate_evicts_other_caches_and_claims() {
    let cache = MemoryCache::default();
    cache.open("gnstore-shell-v0").unwrap();
    cache.open("runtime").unwrap();
    let mut shell = OfflineShell::new(cache, FakeNetwork::default(), origin(), "v1");

    shell.install().await.unwrap();
    let evicted = shell.activate().unwrap();

    assert_eq!(evicted, vec!["gnstore-shell-v0".to_string(), "runtime".to_string()]);
    assert_eq!(shell.state(), ShellState::Active);
    assert!(shell.clients_claimed());
    assert_eq!(shell.cache().cache_names().unwrap(), vec!["gnstore-shell-v1".to_string()]);
    assert_eq!(shell.cache().active().unwrap().as_deref(), Some("gnstore-shell-v1"));
  }

  #[tokio::test]
  async fn test_resume_restores_lifecycle() {
    let mut shell = shell("v1");
    shell.install().await.unwrap();
    let OfflineShell { cache, network, .. } = shell;

    let mut shell = OfflineShell::resume(cache, network, origin(), "v1").unwrap();
    assert_eq!(shell.state(), ShellState::Installed);
    shell.activate().unwrap();

    let OfflineShell { cache, network, .. } = shell;
    let shell = OfflineShell::resume(cache, network, origin(), "v1").unwrap();
    assert_eq!(shell.state(), ShellState::Active);

    let OfflineShell { cache, network, .. } = shell;
    let shell = OfflineShell::resume(cache, network, origin(), "v2").unwrap();
    assert_eq!(shell.state(), ShellState::Idle);
  }

  #[tokio::test]
  async fn test_fetch_is_cache_first_then_network() {
    let mut shell = shell("v1");
    shell.install().await.unwrap();
    shell.activate().unwrap();
    let calls_after_install = shell.network.calls();

    let outcome = shell.fetch(&get("/index.html")).await;
    assert!(matches!(outcome, FetchOutcome::FromCache(_)));
    assert_eq!(shell.network.calls(), calls_after_install);

    let outcome = shell.fetch(&get("/app.js")).await;
    assert!(matches!(outcome, FetchOutcome::FromNetwork(_)));

    // Second request for the same asset is now served from the cache
    let outcome = shell.fetch(&get("/app.js")).await;
    assert_eq!(outcome.label(), "cache");
    assert_eq!(outcome.response().unwrap().body, b"</app.js>".to_vec());
  }

  #[tokio::test]
  async fn test_fetch_falls_back_to_offline_document() {
    let mut shell = shell("v1");
    shell.install().await.unwrap();
    shell.activate().unwrap();
    shell.network.go_offline();

    let outcome = shell.fetch(&get("/products/p1")).await;
    match outcome {
      FetchOutcome::Fallback(page) => assert_eq!(page.body, b"</offline.html>".to_vec()),
      other => panic!("expected fallback, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_fetch_unavailable_without_offline_document() {
    let cache = MemoryCache::default();
    cache.open("gnstore-shell-v1").unwrap();
    cache.set_active("gnstore-shell-v1").unwrap();
    let shell = OfflineShell::resume(cache, FakeNetwork::default(), origin(), "v1").unwrap();
    assert_eq!(shell.state(), ShellState::Active);
    shell.network.go_offline();

    let outcome = shell.fetch(&get("/")).await;
    assert!(matches!(outcome, FetchOutcome::Unavailable(_)));
    assert!(outcome.response().is_none());
  }

  #[tokio::test]
  async fn test_non_get_requests_pass_through() {
    let mut shell = shell("v1");
    shell.install().await.unwrap();
    shell.activate().unwrap();

    let request = ShellRequest {
      method: "POST".to_string(),
      url: origin().join("/index.html").unwrap(),
    };
    let calls_before = shell.network.calls();
    let outcome = shell.fetch(&request).await;
    assert!(matches!(outcome, FetchOutcome::Passthrough(Ok(_))));
    assert_eq!(shell.network.calls(), calls_before + 1);
    assert!(shell
      .network
      .calls
      .lock()
      .unwrap()
      .last()
      .is_some_and(|c| c.starts_with("POST ")));
  }

  #[tokio::test]
  async fn test_store_failures_are_ignored() {
    let cache = MemoryCache {
      fail_puts: true,
      ..Default::default()
    };
    cache.open("gnstore-shell-v1").unwrap();
    cache.set_active("gnstore-shell-v1").unwrap();
    let shell = OfflineShell::resume(cache, FakeNetwork::default(), origin(), "v1").unwrap();

    let outcome = shell.fetch(&get("/style.css")).await;
    assert!(matches!(outcome, FetchOutcome::FromNetwork(_)));
  }

  #[tokio::test]
  async fn test_failed_install_leaves_no_cache() {
    let network = FakeNetwork::default();
    network.go_offline();
    let mut shell = OfflineShell::new(MemoryCache::default(), network, origin(), "v1");
    assert!(shell.install().await.is_err());
    assert!(shell.cache().cache_names().unwrap().is_empty());
  }

  #[test]
  fn test_resume_without_cache_is_idle() {
    let shell =
      OfflineShell::resume(MemoryCache::default(), FakeNetwork::default(), origin(), "v2").unwrap();
    assert_eq!(shell.state(), ShellState::Idle);
    assert_eq!(shell.cache_name(), "gnstore-shell-v2");
  }
}
