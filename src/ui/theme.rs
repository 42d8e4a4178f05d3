use crate::state::Theme;
use ratatui::prelude::*;

/// Colors for one theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
  pub fg: Color,
  pub bg: Color,
  pub bar_bg: Color,
  pub muted: Color,
  pub accent: Color,
  pub highlight: Color,
  pub price: Color,
  pub ok: Color,
  pub warn: Color,
  pub error: Color,
}

impl Palette {
  pub fn for_theme(theme: Theme) -> Self {
    match theme {
      Theme::Dark => Self {
        fg: Color::White,
        bg: Color::Reset,
        bar_bg: Color::Black,
        muted: Color::DarkGray,
        accent: Color::Cyan,
        highlight: Color::DarkGray,
        price: Color::Yellow,
        ok: Color::Green,
        warn: Color::Yellow,
        error: Color::Red,
      },
      Theme::Light => Self {
        fg: Color::Black,
        bg: Color::White,
        bar_bg: Color::Gray,
        muted: Color::DarkGray,
        accent: Color::Blue,
        highlight: Color::Gray,
        price: Color::Magenta,
        ok: Color::Green,
        warn: Color::Rgb(176, 96, 0),
        error: Color::Red,
      },
    }
  }

  pub fn text(&self) -> Style {
    Style::default().fg(self.fg).bg(self.bg)
  }

  pub fn selected(&self) -> Style {
    Style::default()
      .bg(self.highlight)
      .add_modifier(Modifier::BOLD)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_themes_differ() {
    assert_ne!(
      Palette::for_theme(Theme::Light),
      Palette::for_theme(Theme::Dark)
    );
  }

  #[test]
  fn test_text_is_readable_on_both() {
    for theme in [Theme::Light, Theme::Dark] {
      let palette = Palette::for_theme(theme);
      assert_ne!(palette.fg, palette.bg);
    }
  }
}
