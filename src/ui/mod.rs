pub mod components;
pub mod renderfns;
pub mod theme;
pub mod view;
pub mod views;

use crate::state::AppState;
use components::CommandInput;
use ratatui::prelude::*;
use ratatui::widgets::{Block, ListState};
use theme::Palette;
use view::View;

/// Width of the cart panel when it is open
const CART_WIDTH: u16 = 44;

/// Everything one frame needs, borrowed from the App
pub struct Screen<'a> {
  pub state: &'a AppState,
  pub view: &'a mut dyn View,
  /// Present while the cart panel is open
  pub cart: Option<&'a mut dyn View>,
  pub cart_focused: bool,
  pub command: &'a CommandInput,
}

/// Main draw function
pub fn draw(frame: &mut Frame, mut screen: Screen<'_>) {
  let palette = Palette::for_theme(screen.state.theme);
  frame.render_widget(Block::default().style(palette.text()), frame.area());

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Footer
    ])
    .split(frame.area());

  let (main, side) = match screen.cart {
    Some(_) => {
      let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(CART_WIDTH)])
        .split(rows[1]);
      (cols[0], Some(cols[1]))
    }
    None => (rows[1], None),
  };

  let mut breadcrumb = vec![screen.view.breadcrumb_label(screen.state)];
  let shortcuts = match &screen.cart {
    Some(cart) if screen.cart_focused => {
      breadcrumb.push(cart.breadcrumb_label(screen.state));
      cart.shortcuts()
    }
    _ => screen.view.shortcuts(),
  };

  renderfns::draw_header(frame, rows[0], screen.state, &shortcuts, &palette);

  screen.view.render(frame, main, screen.state, &palette);
  if let (Some(cart), Some(area)) = (screen.cart, side) {
    cart.render(frame, area, screen.state, &palette);
  }

  renderfns::draw_footer(
    frame,
    rows[2],
    &breadcrumb,
    screen.state.notice.as_ref(),
    &palette,
  );

  screen.command.render_overlay(frame, main, &palette);
}

/// Keep a list selection inside `len` items, selecting the first when none is
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  if len == 0 {
    state.select(None);
    return;
  }
  match state.selected() {
    Some(idx) if idx >= len => state.select(Some(len - 1)),
    None => state.select(Some(0)),
    _ => {}
  }
}
