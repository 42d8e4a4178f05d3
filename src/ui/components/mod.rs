mod command_input;
mod filter_bar;
mod input;
mod key_result;
mod search_input;

pub use command_input::{CommandEvent, CommandInput};
pub use filter_bar::FilterBar;
pub use key_result::KeyResult;
pub use search_input::{SearchEvent, SearchInput};
