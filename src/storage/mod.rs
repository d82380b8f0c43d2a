//! Durable client-side key/value state.
//!
//! Everything the message subsystem persists (current mode, catalog copy and its
//! fetch timestamp) goes through the [`Storage`] trait as plain strings.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use thiserror::Error;
use tracing::info;

/// Current [`Mode`](crate::mode::Mode), stored as `MOCK` or `API`.
pub const MODE_KEY: &str = "app.mode";
/// Serialized catalog as a JSON array of message entries.
pub const CATALOG_KEY: &str = "messages.catalog";
/// Epoch millis of the last full catalog fetch.
pub const FETCHED_AT_KEY: &str = "messages.fetched_at";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(#[from] sled::Error),
    #[error("stored value for {key} is not valid UTF-8")]
    InvalidUtf8 { key: String },
    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// On-disk storage backed by a sled tree.
pub struct SledStorage {
    db: sled::Db,
}

impl SledStorage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening state store at: {}", path.display());
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Throwaway store removed when dropped.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }
}

impl Storage for SledStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.db.get(key)? {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|_| StorageError::InvalidUtf8 { key: key.to_string() }),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db.insert(key, value.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db.remove(key)?;
        self.db.flush()?;
        Ok(())
    }
}

/// Process-local storage for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
        Ok(())
    }
}
