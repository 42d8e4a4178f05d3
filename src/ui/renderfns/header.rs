use crate::checkout::format_currency;
use crate::state::AppState;
use crate::ui::theme::Palette;
use crate::ui::view::ShortcutInfo;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar: store title, catalog source, cart summary, and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  state: &AppState,
  shortcuts: &[ShortcutInfo],
  palette: &Palette,
) {
  let sep = || Span::styled("│", Style::default().fg(palette.muted));

  let mut spans = vec![
    Span::styled(
      format!(" {} ", state.store().title),
      Style::default().fg(palette.accent).bold(),
    ),
    sep(),
    Span::styled(
      format!(" {} ", source_text(state)),
      Style::default().fg(palette.fg),
    ),
    sep(),
    Span::styled(
      format!(" {} ", cart_text(state)),
      Style::default().fg(palette.price).bold(),
    ),
    Span::raw("  "),
  ];

  let mut sorted: Vec<&ShortcutInfo> = shortcuts.iter().collect();
  sorted.sort_by_key(|s| s.priority);
  for shortcut in sorted {
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(palette.accent),
    ));
    spans.push(Span::styled(
      format!(" {}   ", shortcut.label),
      Style::default().fg(palette.muted),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(palette.bar_bg));
  frame.render_widget(paragraph, area);
}

fn source_text(state: &AppState) -> String {
  match (state.source, state.refreshing) {
    (None, _) => "loading...".to_string(),
    (Some(source), true) => format!("{} (refreshing)", source.label()),
    (Some(source), false) => source.label().to_string(),
  }
}

fn cart_text(state: &AppState) -> String {
  if state.cart.is_empty() {
    return "Cart empty".to_string();
  }
  format!(
    "Cart {} · {}",
    state.cart.total_units(),
    format_currency(state.cart.subtotal(), &state.store().currency)
  )
}
