use crate::cache::{keys, KeyValueStore, LocalCache};
use crate::cart::{self, Cart};
use crate::catalog::{CatalogSource, FetchedCatalog, ImageReplacement, Product};
use crate::commands::{self, Invocation};
use crate::config::StoreConfig;
use crate::event::{Event, EventHandler};
use crate::loader::CatalogLoader;
use crate::query::{Query, QueryState};
use crate::route::Route;
use crate::state::{Action, AppState, Effect, Theme};
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{CartView, CatalogView, ProductDetailView};
use crate::ui::{self, Screen};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use futures::future::{BoxFuture, FutureExt};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const TICK_RATE: Duration = Duration::from_millis(250);

/// Ticks a notice stays on screen (about four seconds)
const NOTICE_TICKS: u32 = 16;

/// Image pass over a freshly loaded catalog
type ImageJob = Arc<dyn Fn(Vec<Product>) -> BoxFuture<'static, Vec<ImageReplacement>> + Send + Sync>;

/// Writes that must land in the order they were requested
enum Persist {
  Cart(Cart),
  Theme(Theme),
}

/// Single writer for the local store, so a later cart never loses to an earlier one
fn spawn_persister<S: KeyValueStore + 'static>(
  cache: LocalCache<S>,
) -> mpsc::UnboundedSender<Persist> {
  let (tx, mut rx) = mpsc::unbounded_channel();
  tokio::spawn(async move {
    while let Some(job) = rx.recv().await {
      let result = match &job {
        Persist::Cart(cart) => cart::save_cart(&cache, cart).await,
        Persist::Theme(theme) => cache.set(keys::THEME, theme).await,
      };
      if let Err(e) = result {
        tracing::warn!(error = %e, "failed to persist local state");
      }
    }
  });
  tx
}

/// Main application state
pub struct App {
  state: AppState,

  /// Background catalog refresh
  refresh: Query<FetchedCatalog>,
  shrink_images: ImageJob,

  catalog: CatalogView,
  detail: ProductDetailView,
  cart: CartView,
  cart_open: bool,
  cart_focused: bool,

  /// Command input (after pressing :)
  command: CommandInput,

  persist_tx: mpsc::UnboundedSender<Persist>,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  notice_ticks: u32,
  should_quit: bool,
}

impl App {
  /// Restore cart and theme, paint a fresh cached catalog if there is one
  pub async fn new<S: KeyValueStore + 'static>(
    store: StoreConfig,
    cache: LocalCache<S>,
    loader: CatalogLoader<S>,
    route: Route,
  ) -> Self {
    let cart = cart::load_cart(&cache).await;
    let theme = match cache.get::<Theme>(keys::THEME).await {
      Ok(theme) => theme.unwrap_or_default(),
      Err(e) => {
        tracing::warn!(error = %e, "ignoring unreadable theme");
        Theme::default()
      }
    };

    let mut state = AppState::new(store, cart, theme, route);
    if let Some(products) = loader.load_cached().await {
      state.apply(Action::CatalogLoaded {
        products,
        source: CatalogSource::Cache,
      });
    }

    let image_loader = loader.clone();
    let shrink_images: ImageJob = Arc::new(move |products: Vec<Product>| {
      let loader = image_loader.clone();
      async move { loader.shrink_images(&products).await }.boxed()
    });

    let refresh = Query::new(move || {
      let loader = loader.clone();
      async move { Ok(loader.refresh().await) }
    });

    let (tx, _rx) = mpsc::unbounded_channel();

    Self {
      state,
      refresh,
      shrink_images,
      catalog: CatalogView::new(),
      detail: ProductDetailView::new(),
      cart: CartView::new(),
      cart_open: false,
      cart_focused: false,
      command: CommandInput::new(),
      persist_tx: spawn_persister(cache),
      event_tx: tx,
      notice_ticks: 0,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(TICK_RATE);
    self.event_tx = events.sender();

    self.start_refresh();

    let result = self.event_loop(&mut terminal, &mut events).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop<B: Backend>(
    &mut self,
    terminal: &mut Terminal<B>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self.screen()))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }
    Ok(())
  }

  fn screen(&mut self) -> Screen<'_> {
    let view: &mut dyn View = match self.state.route {
      Route::Catalog => &mut self.catalog,
      Route::ProductDetail(_) => &mut self.detail,
    };
    let cart: Option<&mut dyn View> = if self.cart_open {
      Some(&mut self.cart)
    } else {
      None
    };
    Screen {
      state: &self.state,
      view,
      cart,
      cart_focused: self.cart_focused,
      command: &self.command,
    }
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => self.tick(),
      Event::Resize => {} // Next draw picks up the new size
      Event::TaskFailed(message) => self.dispatch(Action::ReportError(message)),
      Event::ImagesReplaced(replacements) => {
        self.state.apply(Action::ImagesReplaced(replacements));
      }
    }
  }

  fn tick(&mut self) {
    if self.refresh.poll() {
      match self.refresh.state() {
        QueryState::Success(catalog) => {
          let products = catalog.products.clone();
          let action = Action::CatalogLoaded {
            products: products.clone(),
            source: catalog.source,
          };
          self.dispatch(action);
          self.start_image_pass(products);
        }
        QueryState::Error(e) => {
          let action = Action::LoadFailed(e.clone());
          self.dispatch(action);
        }
        QueryState::Idle | QueryState::Loading => {}
      }
    }

    if self.state.notice.is_some() {
      self.notice_ticks += 1;
      if self.notice_ticks >= NOTICE_TICKS {
        self.state.apply(Action::DismissNotice);
        self.notice_ticks = 0;
      }
    }
  }

  fn start_refresh(&mut self) {
    if self.refresh.fetch() {
      self.dispatch(Action::LoadStarted);
    } else {
      tracing::debug!("refresh already in flight");
    }
  }

  /// Shrink images in the background; the list is already on screen
  fn start_image_pass(&self, products: Vec<Product>) {
    let job = self.shrink_images.clone();
    let tx = self.event_tx.clone();
    tokio::spawn(async move {
      let replaced = job(products).await;
      if !replaced.is_empty() {
        let _ = tx.send(Event::ImagesReplaced(replaced));
      }
    });
  }

  /// Apply an action and run whatever it asks for
  fn dispatch(&mut self, action: Action) {
    self.notice_ticks = 0;
    for effect in self.state.apply(action) {
      self.run_effect(effect);
    }
  }

  fn run_effect(&self, effect: Effect) {
    match effect {
      Effect::PersistCart(cart) => self.persist(Persist::Cart(cart)),
      Effect::PersistTheme(theme) => self.persist(Persist::Theme(theme)),
      Effect::OpenLink(url) => self.open_external(url.to_string()),
    }
  }

  fn persist(&self, job: Persist) {
    if self.persist_tx.send(job).is_err() {
      tracing::warn!("local store writer has stopped");
    }
  }

  /// Hand a URL to the system browser without blocking the UI
  fn open_external(&self, target: String) {
    let tx = self.event_tx.clone();
    tokio::task::spawn_blocking(move || {
      if let Err(e) = webbrowser::open(&target) {
        tracing::warn!(error = %e, url = %target, "failed to open browser");
        let _ = tx.send(Event::TaskFailed(format!("Could not open link: {}", e)));
      }
    });
  }

  fn view_is_capturing(&self) -> bool {
    match self.state.route {
      Route::Catalog => self.catalog.is_capturing(),
      Route::ProductDetail(_) => self.detail.is_capturing(),
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    if self.command.is_active() || !self.view_is_capturing() {
      match self.command.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(line)) => {
          self.execute_command(&line);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    let action = if self.cart_open && self.cart_focused {
      self.cart.handle_key(key, &self.state)
    } else {
      match self.state.route {
        Route::Catalog => self.catalog.handle_key(key, &self.state),
        Route::ProductDetail(_) => self.detail.handle_key(key, &self.state),
      }
    };

    match action {
      ViewAction::None => {}
      ViewAction::Ignored => self.handle_global_key(key),
      ViewAction::Dispatch(actions) => {
        for action in actions {
          self.dispatch(action);
        }
      }
      ViewAction::Open(target) => self.open_external(target),
      ViewAction::Close => {
        self.cart_open = false;
        self.cart_focused = false;
      }
    }
  }

  /// Keys every screen shares, tried after the focused view passes
  fn handle_global_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('q') => self.should_quit = true,
      KeyCode::Char('c') => self.toggle_cart(),
      KeyCode::Tab if self.cart_open => self.cart_focused = !self.cart_focused,
      KeyCode::Char('t') => self.dispatch(Action::ToggleTheme),
      KeyCode::Char('r') => self.start_refresh(),
      _ => {}
    }
  }

  /// Open and focus the cart; close it if it already has focus
  fn toggle_cart(&mut self) {
    if self.cart_open && self.cart_focused {
      self.cart_open = false;
      self.cart_focused = false;
    } else {
      self.cart_open = true;
      self.cart_focused = true;
    }
  }

  fn execute_command(&mut self, line: &str) {
    match commands::interpret(line) {
      Ok(Invocation::Dispatch(action)) => self.dispatch(action),
      Ok(Invocation::ToggleCart) => self.toggle_cart(),
      Ok(Invocation::Refresh) => self.start_refresh(),
      Ok(Invocation::Quit) => self.should_quit = true,
      Err(message) => self.dispatch(Action::ReportError(message)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{MemoryStore, SnapshotCache};
  use crate::catalog::client::SourcePlan;
  use crate::catalog::demo::demo_products;
  use crate::catalog::CatalogClient;
  use crate::loader::now_ms;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn loader(cache: &LocalCache<MemoryStore>) -> CatalogLoader<MemoryStore> {
    let client = CatalogClient::with_plan(SourcePlan::Demo).unwrap();
    CatalogLoader::new(client, None, SnapshotCache::new(cache.clone(), 600_000))
  }

  async fn app_with(cache: LocalCache<MemoryStore>) -> App {
    let loader = loader(&cache);
    App::new(StoreConfig::default(), cache, loader, Route::Catalog).await
  }

  fn type_line(app: &mut App, line: &str) {
    app.handle_key(key(KeyCode::Char(':')));
    for c in line.chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }
    app.handle_key(key(KeyCode::Enter));
  }

  /// Let the refresh task finish and feed its result in
  async fn settle(app: &mut App) {
    tokio::time::sleep(Duration::from_millis(50)).await;
    app.tick();
  }

  #[tokio::test]
  async fn test_startup_paints_fresh_cache() {
    let cache = LocalCache::new(MemoryStore::new());
    SnapshotCache::new(cache.clone(), 600_000)
      .write(&demo_products()[..1], now_ms())
      .await
      .unwrap();

    let app = app_with(cache).await;
    assert_eq!(app.state.source, Some(CatalogSource::Cache));
    assert_eq!(app.state.products.len(), 1);
    assert!(!app.state.loading);
  }

  #[tokio::test]
  async fn test_refresh_replaces_catalog() {
    let mut app = app_with(LocalCache::new(MemoryStore::new())).await;
    assert!(app.state.loading);

    app.start_refresh();
    assert!(app.state.refreshing);
    settle(&mut app).await;

    assert_eq!(app.state.source, Some(CatalogSource::Demo));
    assert_eq!(app.state.products.len(), 3);
    assert!(!app.state.refreshing);
  }

  #[tokio::test]
  async fn test_cart_survives_restart() {
    let cache = LocalCache::new(MemoryStore::new());
    let mut app = app_with(cache.clone()).await;
    app.start_refresh();
    settle(&mut app).await;

    // Down from no selection lands on the first row
    app.handle_key(key(KeyCode::Down));
    app.handle_key(key(KeyCode::Char('a')));
    type_line(&mut app, "theme");
    tokio::time::sleep(Duration::from_millis(20)).await;

    let restarted = app_with(cache).await;
    assert_eq!(restarted.state.cart.total_units(), 1);
    assert_eq!(restarted.state.theme, Theme::Dark);
  }

  #[tokio::test]
  async fn test_commands_drive_state() {
    let mut app = app_with(LocalCache::new(MemoryStore::new())).await;
    app.start_refresh();
    settle(&mut app).await;

    type_line(&mut app, "max 10");
    assert_eq!(app.state.filters.max_price, Some(10.0));

    type_line(&mut app, "open p3");
    assert_eq!(app.state.route, Route::ProductDetail("p3".to_string()));

    type_line(&mut app, "bogus");
    assert_eq!(
      app.state.notice.as_ref().map(|n| n.text.as_str()),
      Some("Unknown command: bogus")
    );

    type_line(&mut app, "quit");
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn test_cart_panel_takes_focus() {
    let mut app = app_with(LocalCache::new(MemoryStore::new())).await;
    app.handle_key(key(KeyCode::Char('c')));
    assert!(app.cart_open && app.cart_focused);

    app.handle_key(key(KeyCode::Esc));
    assert!(!app.cart_open);
  }

  #[tokio::test]
  async fn test_search_text_does_not_trigger_commands() {
    let mut app = app_with(LocalCache::new(MemoryStore::new())).await;
    app.handle_key(key(KeyCode::Char('/')));
    for c in "a:q".chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }
    assert_eq!(app.state.filters.query, "a:q");
    assert!(!app.command.is_active());
    assert!(!app.should_quit);
  }

  #[tokio::test]
  async fn test_late_images_update_loaded_catalog() {
    let mut app = app_with(LocalCache::new(MemoryStore::new())).await;
    app.start_refresh();
    settle(&mut app).await;
    assert!(!app.state.refreshing);

    let first = app.state.products[0].clone();
    app.handle_event(Event::ImagesReplaced(vec![ImageReplacement {
      id: first.id.clone(),
      source: first.image.clone(),
      local: "file:///tmp/first.jpg".to_string(),
    }]));

    assert_eq!(app.state.products[0].image, "file:///tmp/first.jpg");
    assert_eq!(app.state.notice, None);
  }

  #[tokio::test]
  async fn test_notices_expire() {
    let mut app = app_with(LocalCache::new(MemoryStore::new())).await;
    app.dispatch(Action::ReportError("boom".to_string()));
    for _ in 0..NOTICE_TICKS {
      app.tick();
    }
    assert!(app.state.notice.is_none());
  }
}
