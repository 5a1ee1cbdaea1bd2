//! Database integration tests
//!
//! Statement logging through the callback chains of a real SQLite handle.

mod plugin;
mod values;
