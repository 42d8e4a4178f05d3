use crate::state::{Notice, NoticeKind};
use crate::ui::theme::Palette;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the footer: breadcrumb on the left, the current notice after it
pub fn draw_footer(
  frame: &mut Frame,
  area: Rect,
  breadcrumb: &[String],
  notice: Option<&Notice>,
  palette: &Palette,
) {
  let mut spans = vec![Span::raw(" ")];

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(palette.muted)));
    }

    let style = if i == breadcrumb.len() - 1 {
      Style::default().fg(palette.accent).bold()
    } else {
      Style::default().fg(palette.fg)
    };

    spans.push(Span::styled(part.clone(), style));
  }

  if let Some(notice) = notice {
    let color = match notice.kind {
      NoticeKind::Info => palette.ok,
      NoticeKind::Error => palette.error,
    };
    spans.push(Span::styled("   ", Style::default()));
    spans.push(Span::styled(notice.text.clone(), Style::default().fg(color).bold()));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(palette.bar_bg));
  frame.render_widget(paragraph, area);
}
