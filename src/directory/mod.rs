//! Notification directory: recipient identity → push-delivery endpoint.
//!
//! Registration flows (outside this crate) write one [`DirectoryRecord`] per
//! recipient. The dispatcher reads them back through [`Directory`] to learn
//! where, and with which token, a notification must be delivered.
//!
//! # Architecture
//!
//! ```text
//! Directory (accessor: validation, logging, degrade policy)
//!     │
//!     ├── key::resolve_key   identity → "{prefix}:user:{id}" | "{prefix}:token:..."
//!     │
//!     └── DirectoryStore (trait)
//!         ├── RestDirectoryStore    hosted Redis-over-HTTP store
//!         └── MemoryDirectoryStore  in-process map
//! ```
//!
//! # Degrading
//!
//! A directory without a store (credentials not configured) or whose store
//! fails never raises: `get` reports "no entry" and `set`/`delete` log a
//! warning and do nothing. Only malformed input is returned as an error.

// Rust guideline compliant 2026-02

pub mod key;
pub mod rest;
pub mod store;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use key::{redacted_key, resolve_key, token_preview, RecipientIdentity};
pub use rest::RestDirectoryStore;
pub use store::{DirectoryStore, MemoryDirectoryStore};

use crate::error::NotifyError;

/// One recipient's current push-delivery credential.
///
/// Stored as `{"token": ..., "url": ...}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    /// Opaque token the endpoint uses to address the recipient.
    #[serde(rename = "token")]
    pub delivery_token: String,
    /// Absolute URL of the delivery endpoint.
    #[serde(rename = "url")]
    pub endpoint_url: String,
}

impl DirectoryRecord {
    /// Creates a record.
    pub fn new(delivery_token: impl Into<String>, endpoint_url: impl Into<String>) -> Self {
        Self {
            delivery_token: delivery_token.into(),
            endpoint_url: endpoint_url.into(),
        }
    }

    /// Check that both fields are present and the URL is absolute http(s).
    ///
    /// # Errors
    ///
    /// [`NotifyError::InvalidRecord`] describing the first problem found.
    pub fn validate(&self) -> Result<(), NotifyError> {
        if self.delivery_token.is_empty() {
            return Err(invalid_record("delivery token is empty"));
        }
        if self.endpoint_url.is_empty() {
            return Err(invalid_record("endpoint URL is empty"));
        }
        let url = reqwest::Url::parse(&self.endpoint_url)
            .map_err(|e| invalid_record(&format!("endpoint URL is not absolute: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid_record(&format!(
                "endpoint URL scheme must be http or https, got {}",
                url.scheme()
            )));
        }
        Ok(())
    }
}

fn invalid_record(reason: &str) -> NotifyError {
    NotifyError::InvalidRecord {
        reason: reason.to_string(),
    }
}

/// Validating, logging accessor over a [`DirectoryStore`].
///
/// Created once at startup and shared (via `Arc`) by every dispatcher.
#[derive(Debug, Clone)]
pub struct Directory {
    store: Option<Arc<dyn DirectoryStore>>,
    prefix: String,
}

impl Directory {
    /// Directory backed by `store`, with keys under `prefix`.
    pub fn new(store: Arc<dyn DirectoryStore>, prefix: impl Into<String>) -> Self {
        Self {
            store: Some(store),
            prefix: prefix.into(),
        }
    }

    /// Directory with no backing store. Every lookup misses.
    pub fn disabled(prefix: impl Into<String>) -> Self {
        Self {
            store: None,
            prefix: prefix.into(),
        }
    }

    /// Whether a store is configured.
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Key namespace prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Look up the record for `identity`.
    ///
    /// Returns `Ok(None)` when there is no entry, when the store is not
    /// configured or fails, and when the stored value is not a valid record.
    ///
    /// # Errors
    ///
    /// [`NotifyError::InvalidIdentity`] for a malformed identity.
    pub async fn get(
        &self,
        identity: &RecipientIdentity,
    ) -> Result<Option<DirectoryRecord>, NotifyError> {
        let key = resolve_key(&self.prefix, identity)?;
        let shown = redacted_key(&self.prefix, identity);

        let Some(store) = &self.store else {
            log::debug!("[Directory] op=get key={} outcome=skipped (no store)", shown);
            return Ok(None);
        };

        let raw = match store.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                log::debug!("[Directory] op=get key={} outcome=miss", shown);
                return Ok(None);
            }
            Err(e) => {
                log::warn!("[Directory] op=get key={} outcome=error: {:#}", shown, e);
                return Ok(None);
            }
        };

        match serde_json::from_str::<DirectoryRecord>(&raw) {
            Ok(record) if record.validate().is_ok() => {
                log::debug!(
                    "[Directory] op=get key={} outcome=hit token={} url={}",
                    shown,
                    token_preview(&record.delivery_token),
                    record.endpoint_url
                );
                Ok(Some(record))
            }
            Ok(_) => {
                log::warn!("[Directory] op=get key={} outcome=miss (incomplete record)", shown);
                Ok(None)
            }
            Err(e) => {
                log::warn!("[Directory] op=get key={} outcome=miss (undecodable: {})", shown, e);
                Ok(None)
            }
        }
    }

    /// Store `record` for `identity`, replacing any previous entry.
    ///
    /// Store failures are logged and swallowed.
    ///
    /// # Errors
    ///
    /// [`NotifyError::InvalidRecord`] if the record is incomplete, or
    /// [`NotifyError::InvalidIdentity`]. Nothing is written in either case.
    pub async fn set(
        &self,
        identity: &RecipientIdentity,
        record: &DirectoryRecord,
    ) -> Result<(), NotifyError> {
        record.validate()?;
        let key = resolve_key(&self.prefix, identity)?;
        let shown = redacted_key(&self.prefix, identity);

        let Some(store) = &self.store else {
            log::warn!("[Directory] op=set key={} outcome=skipped (no store)", shown);
            return Ok(());
        };

        let value = match serde_json::to_string(record) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("[Directory] op=set key={} outcome=error: {}", shown, e);
                return Ok(());
            }
        };

        match store.set(&key, &value).await {
            Ok(()) => log::info!(
                "[Directory] op=set key={} outcome=written token={}",
                shown,
                token_preview(&record.delivery_token)
            ),
            Err(e) => log::warn!("[Directory] op=set key={} outcome=error: {:#}", shown, e),
        }
        Ok(())
    }

    /// Remove the entry for `identity`. Absent entries are not an error.
    ///
    /// # Errors
    ///
    /// [`NotifyError::InvalidIdentity`] for a malformed identity.
    pub async fn delete(&self, identity: &RecipientIdentity) -> Result<(), NotifyError> {
        let key = resolve_key(&self.prefix, identity)?;
        let shown = redacted_key(&self.prefix, identity);

        let Some(store) = &self.store else {
            log::warn!("[Directory] op=delete key={} outcome=skipped (no store)", shown);
            return Ok(());
        };

        match store.delete(&key).await {
            Ok(removed) => log::info!(
                "[Directory] op=delete key={} outcome=deleted count={}",
                shown,
                removed
            ),
            Err(e) => log::warn!("[Directory] op=delete key={} outcome=error: {:#}", shown, e),
        }
        Ok(())
    }
}
