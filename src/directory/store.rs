//! Key-value backends for the notification directory.
//!
//! The directory only needs single-key `GET`/`SET`/`DEL` with last-write-wins
//! semantics. [`DirectoryStore`] abstracts over the backend so the accessor
//! can be driven by the hosted REST store in production and by
//! [`MemoryDirectoryStore`] in tests or single-process deployments.

// Rust guideline compliant 2026-02

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// A persistent key-value store addressed by directory key.
///
/// Values are opaque strings (JSON-encoded records). Implementations must
/// treat each call as a single-key operation; no cross-key transactions are
/// required.
#[async_trait]
pub trait DirectoryStore: Send + Sync + std::fmt::Debug {
    /// Fetch the value stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any prior value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Returns the number of keys removed (0 if it was absent).
    async fn delete(&self, key: &str) -> Result<u64>;
}

/// In-process directory store.
///
/// Keeps entries in a map behind an async lock and counts reads and writes
/// so callers can observe how much store traffic an operation caused.
#[derive(Debug, Default)]
pub struct MemoryDirectoryStore {
    entries: RwLock<HashMap<String, String>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryDirectoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `get` calls served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of `set` and `delete` calls served so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl DirectoryStore for MemoryDirectoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<u64> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        let removed = self.entries.write().await.remove(key);
        Ok(u64::from(removed.is_some()))
    }
}
