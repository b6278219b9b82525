//! Orienta Store — SQLite persistence and parameterized filtering.

pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::Store;
pub use types::*;
