/// What a component did with a key it was offered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed with nothing to report
  Handled,
  /// Consumed; the owner should act on this
  Event(T),
  /// Not for this component; offer it to the next handler
  NotHandled,
}
