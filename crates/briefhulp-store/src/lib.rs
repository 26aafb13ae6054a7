//! Briefhulp Store: example-letter corpus (SQLite FTS5 + int8 vectors) and
//! the local append-only feedback log.

pub mod embedding;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::SqliteStore;
pub use types::*;
