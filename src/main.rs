mod app;
mod cache;
mod cart;
mod catalog;
mod checkout;
mod commands;
mod config;
mod event;
mod filters;
mod loader;
mod query;
mod route;
mod shell;
mod state;
mod ui;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

use cache::{KeyValueStore, LocalCache, MemoryStore, SnapshotCache, SqliteStore};
use catalog::{CatalogClient, ImageShrinker};
use config::Config;
use loader::CatalogLoader;
use route::Route;
use shell::{AssetCache, FetchOutcome, HttpNetwork, OfflineShell, ShellRequest, ShellState};

#[derive(Parser, Debug)]
#[command(name = "gnstore")]
#[command(about = "A terminal storefront for spreadsheet-published product catalogs")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./gnstore.yaml or $XDG_CONFIG_HOME/gnstore/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Published CSV export to load products from
  #[arg(long)]
  csv_url: Option<String>,

  /// Keep the cart, theme and catalog snapshot in memory only
  #[arg(long)]
  no_cache: bool,

  /// Start location, e.g. "#/product/p1"
  #[arg(long)]
  route: Option<String>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Manage the offline shell of the web storefront
  Shell {
    #[command(subcommand)]
    action: ShellAction,
  },
}

#[derive(Subcommand, Debug)]
enum ShellAction {
  /// Pre-cache the shell documents and activate the new version
  Install,
  /// Activate an installed shell, evicting every other cache
  Activate,
  /// Answer a request the way the shell would
  Fetch {
    /// Path relative to the shell origin, e.g. "/index.html"
    path: String,
    #[arg(long, default_value = "GET")]
    method: String,
  },
  /// Show the installed version and stored caches
  Status,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // The TUI owns the terminal, so it logs to a file
  let _guard = match &args.command {
    None => Some(init_file_logging()?),
    Some(_) => {
      init_stderr_logging();
      None
    }
  };

  let mut config = Config::load(args.config.as_deref())?;
  if let Some(csv_url) = args.csv_url {
    config.catalog.csv_url = Some(csv_url);
  }

  match args.command {
    Some(Command::Shell { action }) => run_shell(&config, action).await,
    None => {
      let route = args.route.as_deref().map(Route::parse).unwrap_or_default();
      if args.no_cache {
        run_storefront(config, MemoryStore::new(), route).await
      } else {
        let store = SqliteStore::open(&Config::data_dir()?.join("store.db"))?;
        run_storefront(config, store, route).await
      }
    }
  }
}

fn env_filter() -> EnvFilter {
  EnvFilter::try_from_env("GNSTORE_LOG").unwrap_or_else(|_| "info".into())
}

fn init_file_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let dir = Config::data_dir()?;
  std::fs::create_dir_all(&dir).map_err(|e| eyre!("Failed to create data directory: {}", e))?;

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
    &dir,
    "gnstore.log",
  ));

  tracing_subscriber::registry()
    .with(env_filter())
    .with(
      tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false),
    )
    .init();

  Ok(guard)
}

fn init_stderr_logging() {
  tracing_subscriber::registry()
    .with(env_filter())
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();
}

async fn run_storefront<S: KeyValueStore + 'static>(
  config: Config,
  store: S,
  route: Route,
) -> Result<()> {
  let client = CatalogClient::new(&config)?;
  tracing::info!(source = ?client.plan().source(), "starting storefront");

  let shrinker = if config.images.enabled {
    Some(
      ImageShrinker::new(client.http().clone(), config.images.max_width)?
        .with_timeout(Duration::from_secs(config.images.timeout_secs)),
    )
  } else {
    None
  };

  let cache = LocalCache::new(store);
  let snapshots = SnapshotCache::new(cache.clone(), config.cache_ttl_ms());
  let loader = CatalogLoader::new(client, shrinker, snapshots);

  let mut app = app::App::new(config.store.clone(), cache, loader, route).await;
  app.run().await
}

async fn run_shell(config: &Config, action: ShellAction) -> Result<()> {
  let origin = config
    .shell
    .origin
    .as_deref()
    .ok_or_else(|| eyre!("shell.origin is not set in the config file"))?;
  let origin = Url::parse(origin).map_err(|e| eyre!("Invalid shell origin {}: {}", origin, e))?;

  let store = SqliteStore::open(&Config::data_dir()?.join("store.db"))?;
  let network = HttpNetwork::new(reqwest::Client::new());
  let mut shell = OfflineShell::resume(store, network, origin.clone(), &config.shell.version)?;

  match action {
    ShellAction::Install => {
      shell.install().await?;
      let evicted = shell.activate()?;
      println!("installed {}", shell.cache_name());
      for name in evicted {
        println!("evicted {}", name);
      }
    }
    ShellAction::Activate => {
      let evicted = shell.activate()?;
      println!("active {}", shell.cache_name());
      for name in evicted {
        println!("evicted {}", name);
      }
    }
    ShellAction::Fetch { path, method } => {
      let url = origin
        .join(&path)
        .map_err(|e| eyre!("Invalid path {}: {}", path, e))?;
      let mut request = ShellRequest::get(url);
      request.method = method.to_uppercase();

      let outcome = shell.fetch(&request).await;
      eprintln!("served from {}", outcome.label());
      match (&outcome, outcome.response()) {
        (_, Some(response)) => {
          eprintln!("status {}", response.status);
          std::io::stdout().write_all(&response.body)?;
        }
        (FetchOutcome::Passthrough(Err(e)) | FetchOutcome::Unavailable(e), None) => {
          return Err(eyre!("{} is unavailable: {}", request.url, e));
        }
        (_, None) => return Err(eyre!("{} is unavailable", request.url)),
      }
    }
    ShellAction::Status => {
      let state = match shell.state() {
        ShellState::Idle => "not installed",
        ShellState::Installed if shell.skip_waiting() => "installed, ready to activate",
        ShellState::Installed => "installed, waiting to activate",
        ShellState::Active if shell.clients_claimed() => "active",
        ShellState::Active => "active, not yet controlling",
      };
      println!("{}: {}", shell.cache_name(), state);
      for name in shell.cache().cache_names()? {
        println!("  cache {}", name);
      }
    }
  }

  Ok(())
}
