use crate::catalog::Product;
use crate::checkout::format_currency;
use crate::filters::ALL_CATEGORIES;
use crate::route::Route;
use crate::state::{Action, AppState};
use crate::ui::components::{FilterBar, KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{stock_label, truncate};
use crate::ui::theme::Palette;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Product grid with search, category and brand tabs, and sort
pub struct CatalogView {
  list_state: ListState,
  search: SearchInput,
  categories: FilterBar,
  brands: FilterBar,
}

impl CatalogView {
  pub fn new() -> Self {
    Self {
      list_state: ListState::default(),
      search: SearchInput::new(),
      categories: FilterBar::new("Category", KeyCode::Left, KeyCode::Right),
      brands: FilterBar::new("Brand", KeyCode::Char('['), KeyCode::Char(']')),
    }
  }

  fn selected<'a>(&self, state: &'a AppState) -> Option<&'a Product> {
    let idx = self.list_state.selected()?;
    state.visible().get(idx).copied()
  }

  /// Filter changes move the cursor back to the top
  fn refilter(&mut self, action: Action) -> ViewAction {
    self.list_state.select(Some(0));
    ViewAction::dispatch(action)
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect, state: &AppState, palette: &Palette) {
    let visible = state.visible();
    ensure_valid_selection(&mut self.list_state, visible.len());

    let title = if state.loading {
      " Products (loading...) ".to_string()
    } else {
      format!(" Products ({} of {}) ", visible.len(), state.products.len())
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(palette.accent))
      .style(palette.text());

    if visible.is_empty() {
      let content = if state.loading {
        "Loading products..."
      } else if state.products.is_empty() {
        "No products available."
      } else {
        "No products match your filters. Press x to reset them."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(palette.muted));
      frame.render_widget(paragraph, area);
      return;
    }

    let currency = &state.store().currency;
    let items: Vec<ListItem> = visible
      .iter()
      .map(|product| {
        let (stock, stock_color) = stock_label(product, palette);
        let in_cart = state.cart.quantity(&product.id);
        let mut spans = vec![
          Span::styled(
            format!("{:<36}", truncate(&product.title, 36)),
            Style::default().fg(palette.fg),
          ),
          Span::raw(" "),
          Span::styled(
            format!("{:<14}", truncate(&product.category, 14)),
            Style::default().fg(palette.muted),
          ),
          Span::raw(" "),
          Span::styled(
            format!("{:<12}", truncate(&product.brand, 12)),
            Style::default().fg(palette.muted),
          ),
          Span::raw(" "),
          Span::styled(
            format!("{:>16}", format_currency(product.price, currency)),
            Style::default().fg(palette.price),
          ),
          Span::raw("  "),
          Span::styled(stock, Style::default().fg(stock_color)),
        ];
        if in_cart > 0 {
          spans.push(Span::styled(
            format!("  [{} in cart]", in_cart),
            Style::default().fg(palette.accent),
          ));
        }
        ListItem::new(Line::from(spans))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(palette.selected())
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn render_summary(&self, frame: &mut Frame, area: Rect, state: &AppState, palette: &Palette) {
    let filters = &state.filters;
    let currency = &state.store().currency;
    let mut parts = vec![format!("Sort: {}", filters.sort.label())];
    if filters.in_stock_only {
      parts.push("in stock only".to_string());
    }
    if let Some(min) = filters.min_price {
      parts.push(format!("from {}", format_currency(min, currency)));
    }
    if let Some(max) = filters.max_price {
      parts.push(format!("up to {}", format_currency(max, currency)));
    }
    if !filters.query.is_empty() {
      parts.push(format!("\"{}\"", filters.query));
    }
    let active = filters.active_count();
    if active > 0 {
      parts.push(format!("{} filter(s) active", active));
    }

    let line = Line::from(Span::styled(
      format!(" {}", parts.join(" · ")),
      Style::default().fg(palette.muted),
    ));
    frame.render_widget(Paragraph::new(line), area);
  }
}

impl Default for CatalogView {
  fn default() -> Self {
    Self::new()
  }
}

fn category_values(state: &AppState) -> Vec<String> {
  state
    .categories()
    .into_iter()
    .filter(|c| c != ALL_CATEGORIES)
    .collect()
}

fn current_category(state: &AppState) -> Option<&str> {
  let category = state.filters.category.as_str();
  (category != ALL_CATEGORIES).then_some(category)
}

impl View for CatalogView {
  fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> ViewAction {
    // Search first so typing never triggers shortcuts
    match self.search.handle_key(key, &state.filters.query) {
      KeyResult::Event(SearchEvent::Changed(query)) => {
        return self.refilter(Action::SetQuery(query));
      }
      KeyResult::Event(SearchEvent::Submitted) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    let categories = category_values(state);
    match self
      .categories
      .handle_key(key, &categories, current_category(state))
    {
      KeyResult::Event(category) => {
        let category = category.unwrap_or_else(|| ALL_CATEGORIES.to_string());
        return self.refilter(Action::SetCategory(category));
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    let brands = state.brands();
    match self
      .brands
      .handle_key(key, &brands, state.filters.brand.as_deref())
    {
      KeyResult::Event(brand) => return self.refilter(Action::SetBrand(brand)),
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('g') | KeyCode::Home => self.list_state.select_first(),
      KeyCode::Char('G') | KeyCode::End => self.list_state.select_last(),
      KeyCode::Enter => {
        if let Some(product) = self.selected(state) {
          return ViewAction::dispatch(Action::Navigate(Route::ProductDetail(product.id.clone())));
        }
      }
      KeyCode::Char('a') => {
        if let Some(product) = self.selected(state) {
          return ViewAction::dispatch(Action::AddToCart {
            id: product.id.clone(),
            qty: 1,
          });
        }
      }
      KeyCode::Char('s') => return self.refilter(Action::SetSort(state.filters.sort.next())),
      KeyCode::Char('i') => return self.refilter(Action::ToggleInStock),
      KeyCode::Char('x') => return self.refilter(Action::ResetFilters),
      _ => return ViewAction::Ignored,
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, state: &AppState, palette: &Palette) {
    let brands = state.brands();
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1),                                    // Categories
        Constraint::Length(if brands.is_empty() { 0 } else { 1 }), // Brands
        Constraint::Length(1),                                    // Sort and filters
        Constraint::Min(1),                                       // Products
      ])
      .split(area);

    let categories = category_values(state);
    self.categories.render(
      frame,
      chunks[0],
      &categories,
      current_category(state),
      palette,
    );
    if !brands.is_empty() {
      self.brands.render(
        frame,
        chunks[1],
        &brands,
        state.filters.brand.as_deref(),
        palette,
      );
    }
    self.render_summary(frame, chunks[2], state, palette);
    self.render_list(frame, chunks[3], state, palette);

    self.search.render_overlay(frame, chunks[3], palette);
  }

  fn breadcrumb_label(&self, state: &AppState) -> String {
    if state.filters.query.is_empty() {
      "Products".to_string()
    } else {
      format!("Products [{}]", state.filters.query)
    }
  }

  fn is_capturing(&self) -> bool {
    self.search.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("a", "add").with_priority(30),
      ShortcutInfo::new("c", "cart").with_priority(40),
      ShortcutInfo::new("s", "sort").with_priority(50),
      ShortcutInfo::new("←→", "category").with_priority(60),
      ShortcutInfo::new("[]", "brand").with_priority(70),
      ShortcutInfo::new("i", "in stock").with_priority(80),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cart::Cart;
  use crate::catalog::demo::demo_products;
  use crate::catalog::CatalogSource;
  use crate::config::StoreConfig;
  use crate::filters::SortKey;
  use crate::state::Theme;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn state() -> AppState {
    let mut state = AppState::new(StoreConfig::default(), Cart::new(), Theme::Dark, Route::Catalog);
    state.apply(Action::CatalogLoaded {
      products: demo_products(),
      source: CatalogSource::Demo,
    });
    state
  }

  fn dispatched(action: ViewAction) -> Vec<Action> {
    match action {
      ViewAction::Dispatch(actions) => actions,
      other => panic!("expected dispatch, got {:?}", other),
    }
  }

  #[test]
  fn test_enter_opens_selected_product() {
    let state = state();
    let mut view = CatalogView::new();
    view.list_state.select(Some(0));
    view.handle_key(key(KeyCode::Down), &state);

    assert_eq!(
      dispatched(view.handle_key(key(KeyCode::Enter), &state)),
      vec![Action::Navigate(Route::ProductDetail("p2".to_string()))]
    );
  }

  #[test]
  fn test_add_key_adds_one() {
    let state = state();
    let mut view = CatalogView::new();
    view.list_state.select(Some(0));
    assert_eq!(
      dispatched(view.handle_key(key(KeyCode::Char('a')), &state)),
      vec![Action::AddToCart {
        id: "p1".to_string(),
        qty: 1
      }]
    );
  }

  #[test]
  fn test_search_typing_sets_query_live() {
    let state = state();
    let mut view = CatalogView::new();
    assert_eq!(view.handle_key(key(KeyCode::Char('/')), &state), ViewAction::None);
    assert!(view.is_capturing());

    // 'a' is text here, not the add shortcut
    assert_eq!(
      dispatched(view.handle_key(key(KeyCode::Char('a')), &state)),
      vec![Action::SetQuery("a".to_string())]
    );
  }

  #[test]
  fn test_category_tabs_step_through_categories() {
    let mut state = state();
    let mut view = CatalogView::new();

    let actions = dispatched(view.handle_key(key(KeyCode::Right), &state));
    assert_eq!(actions, vec![Action::SetCategory("Headphones".to_string())]);
    state.apply(actions[0].clone());

    let actions = dispatched(view.handle_key(key(KeyCode::Left), &state));
    assert_eq!(actions, vec![Action::SetCategory(ALL_CATEGORIES.to_string())]);
  }

  #[test]
  fn test_brand_tabs() {
    let state = state();
    let mut view = CatalogView::new();
    assert_eq!(
      dispatched(view.handle_key(key(KeyCode::Char('[')), &state)),
      vec![Action::SetBrand(Some("BrandC".to_string()))]
    );
  }

  #[test]
  fn test_sort_cycles() {
    let state = state();
    let mut view = CatalogView::new();
    assert_eq!(
      dispatched(view.handle_key(key(KeyCode::Char('s')), &state)),
      vec![Action::SetSort(SortKey::PriceAsc)]
    );
  }

  #[test]
  fn test_unbound_keys_fall_through() {
    let state = state();
    let mut view = CatalogView::new();
    assert_eq!(view.handle_key(key(KeyCode::Char('c')), &state), ViewAction::Ignored);
  }
}
