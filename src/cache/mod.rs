//! Local key/value persistence for the catalog snapshot, cart and preferences.
//!
//! The storage model mirrors browser local storage: whole JSON blobs under
//! fixed string keys, written synchronously by the backend and exposed through
//! async accessors so callers treat persistence like any other I/O.

mod layer;
mod storage;
mod traits;

pub use layer::{is_fresh, LocalCache, SnapshotCache};
pub use storage::{MemoryStore, SqliteStore};
pub use traits::{keys, KeyValueStore};
