use super::KeyResult;
use crate::ui::renderfns::truncate;
use crate::ui::theme::Palette;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Tab strip for choosing one value of a field, with "all" first.
///
/// Holds no selection of its own: the current value lives in the filter
/// state and is passed in on every call.
#[derive(Debug, Clone)]
pub struct FilterBar {
  label: &'static str,
  prev: KeyCode,
  next: KeyCode,
}

impl FilterBar {
  pub fn new(label: &'static str, prev: KeyCode, next: KeyCode) -> Self {
    Self { label, prev, next }
  }

  /// Move through `values` with wrapping. `None` is "all".
  pub fn handle_key(
    &self,
    key: KeyEvent,
    values: &[String],
    current: Option<&str>,
  ) -> KeyResult<Option<String>> {
    let direction = if key.code == self.next {
      1
    } else if key.code == self.prev {
      -1
    } else {
      return KeyResult::NotHandled;
    };

    if values.is_empty() {
      return KeyResult::Handled;
    }
    KeyResult::Event(step(values, current, direction))
  }

  pub fn render(
    &self,
    frame: &mut Frame,
    area: Rect,
    values: &[String],
    current: Option<&str>,
    palette: &Palette,
  ) {
    let selected_style = Style::default().fg(palette.bg).bg(palette.accent);
    let plain_style = Style::default().fg(palette.muted);

    let mut spans = vec![Span::styled(
      format!("[{}] ", self.label),
      Style::default().fg(palette.warn),
    )];

    let all_style = if current.is_none() {
      selected_style
    } else {
      plain_style
    };
    spans.push(Span::styled(" All ", all_style));

    for value in values {
      spans.push(Span::styled("│", Style::default().fg(palette.muted)));
      let is_selected = current.is_some_and(|c| c.eq_ignore_ascii_case(value));
      let style = if is_selected { selected_style } else { plain_style };
      spans.push(Span::styled(format!(" {} ", truncate(value, 15)), style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
  }
}

/// Tab after (or before) `current`; index 0 is "all"
fn step(values: &[String], current: Option<&str>, direction: i32) -> Option<String> {
  let total = values.len() as i32 + 1;
  let position = current
    .and_then(|c| values.iter().position(|v| v.eq_ignore_ascii_case(c)))
    .map(|i| i as i32 + 1)
    .unwrap_or(0);
  let next = (position + direction).rem_euclid(total);
  if next == 0 {
    None
  } else {
    values.get(next as usize - 1).cloned()
  }
}
