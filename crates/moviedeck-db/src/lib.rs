//! Key/value storage for moviedeck.
//!
//! Provides the async `KeyValueStore` capability used by the session and
//! collection stores, backed either by a bundled `SQLite` file (native
//! persistent storage) or by a process-local map (browser-like storage).

mod connection;
/// Storage capability and its backends.
pub mod kv;
mod migrations;

pub use connection::open_db;
#[allow(clippy::module_name_repetitions)]
pub use kv::{KeyValueStore, LocalKeyValueStore, MemoryStore, SqliteStore, StorageBackend};
