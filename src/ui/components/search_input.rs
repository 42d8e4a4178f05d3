use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::ui::theme::Palette;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events emitted by search input that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
  /// Query changed; emitted on each keystroke and with the previous query on cancel
  Changed(String),
  /// Search submitted (overlay closed, filter persists)
  Submitted,
}

/// Live search box, opened with `/`
#[derive(Debug, Clone, Default)]
pub struct SearchInput {
  input: TextInput,
  active: bool,
  /// Query to restore on Esc
  previous: String,
}

impl SearchInput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Open the box, continuing from the query already applied
  pub fn activate(&mut self, current: &str) {
    self.active = true;
    self.previous = current.to_string();
    self.input.set_value(current);
  }

  /// Handle a key event. Call this regardless of active state; `/` activates.
  pub fn handle_key(&mut self, key: KeyEvent, current: &str) -> KeyResult<SearchEvent> {
    if !self.active {
      if key.code == KeyCode::Char('/') {
        self.activate(current);
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(_) => {
        self.active = false;
        KeyResult::Event(SearchEvent::Submitted)
      }
      InputResult::Cancelled => {
        self.active = false;
        self.input.set_value(&self.previous);
        KeyResult::Event(SearchEvent::Changed(self.previous.clone()))
      }
      InputResult::Consumed => {
        KeyResult::Event(SearchEvent::Changed(self.input.value().to_string()))
      }
      // Swallow everything else so list shortcuts don't fire while typing
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  /// Render the search overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
    if !self.active {
      return;
    }

    let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
    let overlay_area = Rect::new(area.x + 1, area.y + 1, width.saturating_sub(1), 3);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(palette.warn))
      .title(" Search ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let (before, after) = self.input.split_at_cursor();
    let input_line = Line::from(vec![
      Span::styled("/", Style::default().fg(palette.warn)),
      Span::raw(before),
      Span::styled("_", Style::default().fg(palette.warn)),
      Span::raw(after),
    ]);
    frame.render_widget(Paragraph::new(input_line).style(palette.text()), inner);
  }
}
