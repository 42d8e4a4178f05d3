use crate::state::{Action, AppState};
use crate::ui::theme::Palette;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// Actions that a view can request in response to user input
#[derive(Debug, Clone, PartialEq)]
pub enum ViewAction {
  /// Key consumed, nothing else to do
  None,
  /// Key not consumed; the app tries its global bindings
  Ignored,
  /// Feed these actions to the state
  Dispatch(Vec<Action>),
  /// Open a URL in the system browser
  Open(String),
  /// Close the panel that produced this
  Close,
}

impl ViewAction {
  pub fn dispatch(action: Action) -> Self {
    ViewAction::Dispatch(vec![action])
  }
}

/// Trait for view behavior
///
/// Views read the shared `AppState` and return actions for the App to
/// execute, never mutating the state themselves: App → View → Components.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect, state: &AppState, palette: &Palette);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self, state: &AppState) -> String;

  /// True while the view is capturing text input
  fn is_capturing(&self) -> bool {
    false
  }

  /// Get keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("c", "cart").with_priority(20),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}
