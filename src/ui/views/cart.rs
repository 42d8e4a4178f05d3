use crate::cart::CartLine;
use crate::checkout::format_currency;
use crate::state::{Action, AppState};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::truncate;
use crate::ui::theme::Palette;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

/// Cart side panel: line editing, totals, and the order preview
pub struct CartView {
  list_state: ListState,
}

impl CartView {
  pub fn new() -> Self {
    Self {
      list_state: ListState::default(),
    }
  }

  fn selected<'a>(&self, state: &'a AppState) -> Option<&'a CartLine> {
    let idx = self.list_state.selected()?;
    state.cart.lines().nth(idx)
  }

  fn set_quantity(line: &CartLine, qty: u32) -> ViewAction {
    ViewAction::dispatch(Action::SetQuantity {
      id: line.id.clone(),
      qty,
    })
  }
}

impl Default for CartView {
  fn default() -> Self {
    Self::new()
  }
}

impl View for CartView {
  fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> ViewAction {
    match key.code {
      KeyCode::Esc | KeyCode::Char('c') => return ViewAction::Close,
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Right => {
        if let Some(line) = self.selected(state) {
          return Self::set_quantity(line, line.quantity.saturating_add(1));
        }
      }
      KeyCode::Char('-') | KeyCode::Left => {
        if let Some(line) = self.selected(state) {
          return Self::set_quantity(line, line.quantity.saturating_sub(1));
        }
      }
      KeyCode::Char('d') | KeyCode::Delete => {
        if let Some(line) = self.selected(state) {
          return Self::set_quantity(line, 0);
        }
      }
      KeyCode::Char('x') => return ViewAction::dispatch(Action::ClearCart),
      KeyCode::Enter | KeyCode::Char('o') => return ViewAction::dispatch(Action::Checkout),
      _ => return ViewAction::Ignored,
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, state: &AppState, palette: &Palette) {
    let currency = &state.store().currency;
    let block = Block::default()
      .title(format!(" Cart ({}) ", state.cart.total_units()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(palette.warn))
      .style(palette.text());

    if state.cart.is_empty() {
      let paragraph = Paragraph::new("Your cart is empty.\n\nPress a on a product to add it.")
        .block(block)
        .style(Style::default().fg(palette.muted));
      frame.render_widget(paragraph, area);
      return;
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let line_count = state.cart.item_count();
    ensure_valid_selection(&mut self.list_state, line_count);

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Max(line_count as u16 * 2), // Lines
        Constraint::Length(2),                  // Subtotal
        Constraint::Min(0),                     // Order preview
      ])
      .split(inner);

    let width = inner.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = state
      .cart
      .lines()
      .map(|line| {
        ListItem::new(vec![
          Line::from(Span::styled(
            truncate(&line.title, width),
            Style::default().fg(palette.fg),
          )),
          Line::from(vec![
            Span::styled(
              format!("  {} x {}", line.quantity, format_currency(line.price, currency)),
              Style::default().fg(palette.muted),
            ),
            Span::styled(
              format!(" = {}", format_currency(line.line_total(), currency)),
              Style::default().fg(palette.price),
            ),
          ]),
        ])
      })
      .collect();

    let list = List::new(items)
      .highlight_style(palette.selected())
      .highlight_symbol("> ");
    frame.render_stateful_widget(list, chunks[0], &mut self.list_state);

    let subtotal = Paragraph::new(Line::from(vec![
      Span::styled("Subtotal ", Style::default().fg(palette.muted)),
      Span::styled(
        format_currency(state.cart.subtotal(), currency),
        Style::default().fg(palette.price).bold(),
      ),
    ]))
    .block(Block::default().borders(Borders::TOP).border_style(Style::default().fg(palette.muted)));
    frame.render_widget(subtotal, chunks[1]);

    if let Some(message) = state.order_message() {
      let preview = Paragraph::new(message)
        .block(
          Block::default()
            .title(" Order message ")
            .borders(Borders::TOP)
            .border_style(Style::default().fg(palette.muted)),
        )
        .style(Style::default().fg(palette.muted))
        .wrap(Wrap { trim: false });
      frame.render_widget(preview, chunks[2]);
    }
  }

  fn breadcrumb_label(&self, _state: &AppState) -> String {
    "Cart".to_string()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("+/-", "quantity").with_priority(10),
      ShortcutInfo::new("d", "remove").with_priority(20),
      ShortcutInfo::new("x", "clear").with_priority(30),
      ShortcutInfo::new("Enter", "checkout").with_priority(40),
      ShortcutInfo::new("Esc", "close").with_priority(90),
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
  use crate::route::Route;
  use crate::state::Theme;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn state_with_cart() -> AppState {
    let mut state = AppState::new(StoreConfig::default(), Cart::new(), Theme::Light, Route::Catalog);
    state.apply(Action::CatalogLoaded {
      products: demo_products(),
      source: CatalogSource::Demo,
    });
    for id in ["p1", "p2"] {
      state.apply(Action::AddToCart {
        id: id.to_string(),
        qty: 2,
      });
    }
    state
  }

  #[test]
  fn test_plus_and_minus_set_quantity() {
    let state = state_with_cart();
    let mut view = CartView::new();
    view.list_state.select(Some(1));

    assert_eq!(
      view.handle_key(key(KeyCode::Char('+')), &state),
      ViewAction::dispatch(Action::SetQuantity {
        id: "p2".to_string(),
        qty: 3
      })
    );
    assert_eq!(
      view.handle_key(key(KeyCode::Char('-')), &state),
      ViewAction::dispatch(Action::SetQuantity {
        id: "p2".to_string(),
        qty: 1
      })
    );
  }

  #[test]
  fn test_delete_removes_line() {
    let state = state_with_cart();
    let mut view = CartView::new();
    view.list_state.select(Some(0));
    assert_eq!(
      view.handle_key(key(KeyCode::Char('d')), &state),
      ViewAction::dispatch(Action::SetQuantity {
        id: "p1".to_string(),
        qty: 0
      })
    );
  }

  #[test]
  fn test_checkout_and_close() {
    let state = state_with_cart();
    let mut view = CartView::new();
    assert_eq!(
      view.handle_key(key(KeyCode::Enter), &state),
      ViewAction::dispatch(Action::Checkout)
    );
    assert_eq!(view.handle_key(key(KeyCode::Esc), &state), ViewAction::Close);
  }

  #[test]
  fn test_no_selection_does_nothing() {
    let state = state_with_cart();
    let mut view = CartView::new();
    assert_eq!(view.handle_key(key(KeyCode::Char('+')), &state), ViewAction::None);
  }
}
