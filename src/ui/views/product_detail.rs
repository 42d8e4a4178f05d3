use crate::catalog::Product;
use crate::checkout::format_currency;
use crate::route::Route;
use crate::state::{Action, AppState};
use crate::ui::renderfns::stock_label;
use crate::ui::theme::Palette;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// One product with a quantity picker
pub struct ProductDetailView {
  /// Product the picker belongs to; a different product resets it
  product_id: Option<String>,
  quantity: u32,
  scroll: u16,
}

impl ProductDetailView {
  pub fn new() -> Self {
    Self {
      product_id: None,
      quantity: 1,
      scroll: 0,
    }
  }

  pub fn quantity(&self) -> u32 {
    self.quantity
  }

  fn sync(&mut self, state: &AppState) {
    let current = match &state.route {
      Route::ProductDetail(id) => Some(id.as_str()),
      Route::Catalog => None,
    };
    if self.product_id.as_deref() != current {
      self.product_id = current.map(str::to_string);
      self.quantity = 1;
      self.scroll = 0;
    }
  }

  fn render_product(&self, frame: &mut Frame, area: Rect, product: &Product, state: &AppState, palette: &Palette) {
    let label = |text: &str| Span::styled(format!("{:<10}", text), Style::default().fg(palette.muted));
    let (stock, stock_color) = stock_label(product, palette);

    let mut lines = vec![
      Line::from(vec![
        label("Price"),
        Span::styled(
          format_currency(product.price, &state.store().currency),
          Style::default().fg(palette.price).bold(),
        ),
      ]),
      Line::from(vec![label("Stock"), Span::styled(stock, Style::default().fg(stock_color))]),
      Line::from(vec![label("Category"), Span::raw(product.category.clone())]),
    ];
    if !product.brand.is_empty() {
      lines.push(Line::from(vec![label("Brand"), Span::raw(product.brand.clone())]));
    }
    if !product.created_at.is_empty() {
      lines.push(Line::from(vec![label("Added"), Span::raw(product.created_at.clone())]));
    }
    if !product.image.is_empty() {
      lines.push(Line::from(vec![
        label("Image"),
        Span::styled(product.image.clone(), Style::default().fg(palette.accent)),
      ]));
    }

    lines.push(Line::default());
    let in_cart = state.cart.quantity(&product.id);
    if product.in_stock() {
      let mut picker = vec![
        label("Quantity"),
        Span::styled("[-] ", Style::default().fg(palette.accent)),
        Span::styled(self.quantity.to_string(), Style::default().fg(palette.fg).bold()),
        Span::styled(" [+]", Style::default().fg(palette.accent)),
      ];
      if in_cart > 0 {
        picker.push(Span::styled(
          format!("   {} already in cart", in_cart),
          Style::default().fg(palette.muted),
        ));
      }
      lines.push(Line::from(picker));
    } else {
      lines.push(Line::from(Span::styled(
        "This product cannot be added to the cart.",
        Style::default().fg(palette.error),
      )));
    }

    if !product.description.is_empty() {
      lines.push(Line::default());
      for paragraph in product.description.lines() {
        lines.push(Line::from(paragraph.to_string()));
      }
    }

    let block = Block::default()
      .title(format!(" {} ", product.title))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(palette.accent))
      .style(palette.text());

    let paragraph = Paragraph::new(lines)
      .block(block)
      .wrap(Wrap { trim: false })
      .scroll((self.scroll, 0));
    frame.render_widget(paragraph, area);
  }
}

impl Default for ProductDetailView {
  fn default() -> Self {
    Self::new()
  }
}

impl View for ProductDetailView {
  fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> ViewAction {
    self.sync(state);

    if matches!(key.code, KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q')) {
      return ViewAction::dispatch(Action::Navigate(Route::Catalog));
    }

    let Some(product) = state.selected_product() else {
      return ViewAction::Ignored;
    };

    match key.code {
      KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Right => {
        // The picker never offers more than is in stock
        if self.quantity < product.stock {
          self.quantity += 1;
        }
      }
      KeyCode::Char('-') | KeyCode::Left => {
        self.quantity = self.quantity.saturating_sub(1).max(1);
      }
      KeyCode::Char('a') | KeyCode::Enter => {
        return ViewAction::dispatch(Action::AddToCart {
          id: product.id.clone(),
          qty: self.quantity,
        });
      }
      KeyCode::Char('o') if !product.image.is_empty() => {
        return ViewAction::Open(product.image.clone());
      }
      KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
      KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
      _ => return ViewAction::Ignored,
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, state: &AppState, palette: &Palette) {
    self.sync(state);

    match state.selected_product() {
      Some(product) => self.render_product(frame, area, product, state, palette),
      None => {
        let text = if state.loading {
          "Loading product..."
        } else {
          "Product not found. It may have been removed from the catalog. Press Esc to go back."
        };
        let block = Block::default()
          .title(" Product ")
          .borders(Borders::ALL)
          .border_style(Style::default().fg(palette.muted))
          .style(palette.text());
        let paragraph = Paragraph::new(text)
          .block(block)
          .style(Style::default().fg(palette.muted))
          .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
      }
    }
  }

  fn breadcrumb_label(&self, state: &AppState) -> String {
    match state.selected_product() {
      Some(product) => product.title.clone(),
      None => state.route.location(),
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("+/-", "quantity").with_priority(20),
      ShortcutInfo::new("a", "add to cart").with_priority(30),
      ShortcutInfo::new("o", "open image").with_priority(40),
      ShortcutInfo::new("c", "cart").with_priority(50),
      ShortcutInfo::new("Esc", "back").with_priority(90),
    ]
  }
}
