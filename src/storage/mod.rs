/// Storage layer for persisting progress data
///
/// Everything is persisted as string values in a key-value store. This module
/// defines that store interface and its SQLite implementation; the typed,
/// identity-scoped progress operations live in `progress`.

pub mod keys;
pub mod migrations;
pub mod progress;
pub mod sqlite;

// Re-export the main storage types
pub use progress::ProgressStore;
pub use sqlite::*;

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Trait defining the raw key-value interface
///
/// Keys are full keys (already namespaced). This trait allows swapping SQLite
/// for another backend while keeping the progress operations unchanged.
pub trait KeyValueStore {
    /// Read a value
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Create or overwrite a value
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// All keys starting with `prefix`
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}
