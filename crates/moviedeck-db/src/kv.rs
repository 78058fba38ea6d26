//! `KeyValueStore` trait and its storage backends.
#![allow(clippy::future_not_send)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension};

use super::connection::open_db;

/// Async string key/value storage.
///
/// Session data is persisted through this capability only, so the stores
/// never branch on the platform backing it.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(KeyValueStore: Send)]
pub trait LocalKeyValueStore {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<()>;
}

// --- SQLite ---

/// Native persistent storage in a bundled `SQLite` file.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens the database under `dir` (or the default data directory).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(dir: Option<&Path>) -> Result<Self> {
        let conn = open_db(dir)?;
        Ok(Self::from_connection(conn))
    }

    /// Wraps an already migrated connection.
    #[must_use]
    pub const fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("storage connection lock poisoned"))
    }
}

impl LocalKeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        conn.query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()
        .with_context(|| format!("failed to read key {key}"))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            [key, value],
        )
        .with_context(|| format!("failed to write key {key}"))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", [key])
            .with_context(|| format!("failed to remove key {key}"))?;
        Ok(())
    }
}

// --- Memory ---

/// Process-local storage, the counterpart of browser local storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))
    }
}

impl LocalKeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?
            .insert(String::from(key), String::from(value));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

// --- Selection ---

/// Storage backend chosen once at startup.
#[derive(Debug)]
pub enum StorageBackend {
    /// Persistent `SQLite` file.
    Sqlite(SqliteStore),
    /// Process-local map.
    Memory(MemoryStore),
}

impl LocalKeyValueStore for StorageBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self {
            Self::Sqlite(store) => store.get(key).await,
            Self::Memory(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        match self {
            Self::Sqlite(store) => store.set(key, value).await,
            Self::Memory(store) => store.set(key, value).await,
        }
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match self {
            Self::Sqlite(store) => store.remove(key).await,
            Self::Memory(store) => store.remove(key).await,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn test_sqlite_set_get_remove() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(Some(dir.path())).unwrap();

        // Act
        store.set("auth_token", "abc").await.unwrap();
        let stored = store.get("auth_token").await.unwrap();
        store.remove("auth_token").await.unwrap();
        let removed = store.get("auth_token").await.unwrap();

        // Assert
        assert_eq!(stored.as_deref(), Some("abc"));
        assert!(removed.is_none());
    }

    #[tokio::test]
    async fn test_sqlite_set_overwrites() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(Some(dir.path())).unwrap();
        store.set("user", "{\"id\":1}").await.unwrap();

        // Act
        store.set("user", "{\"id\":2}").await.unwrap();

        // Assert
        assert_eq!(
            store.get("user").await.unwrap().as_deref(),
            Some("{\"id\":2}")
        );
    }

    #[tokio::test]
    async fn test_sqlite_persists_across_reopen() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SqliteStore::open(Some(dir.path())).unwrap();
            store.set("auth_token", "persisted").await.unwrap();
        }

        // Act
        let reopened = SqliteStore::open(Some(dir.path())).unwrap();

        // Assert
        assert_eq!(
            reopened.get("auth_token").await.unwrap().as_deref(),
            Some("persisted")
        );
    }

    #[tokio::test]
    async fn test_remove_missing_key_is_ok() {
        // Arrange
        let store = MemoryStore::new();

        // Act
        let result = store.remove("missing").await;

        // Assert
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_backend_delegates_to_memory() {
        // Arrange
        let backend = StorageBackend::Memory(MemoryStore::new());

        // Act
        backend.set("user", "value").await.unwrap();

        // Assert
        assert_eq!(backend.get("user").await.unwrap().as_deref(), Some("value"));
        assert!(backend.get("auth_token").await.unwrap().is_none());
    }
}
