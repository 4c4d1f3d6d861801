//! REST client for the hosted directory store.
//!
//! The store speaks Redis commands over HTTP: each call is a `POST` to the
//! store URL with a JSON command array as body and a bearer token for auth.
//!
//! ```text
//! POST {url}   ["GET", key]          -> {"result": "<value>" | null}
//! POST {url}   ["SET", key, value]   -> {"result": "OK"}
//! POST {url}   ["DEL", key]          -> {"result": 1}
//!                                    -> {"error": "..."} on failure
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::store::DirectoryStore;

/// Response envelope returned for every command.
#[derive(Debug, Deserialize)]
struct CommandResponse {
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
}

/// Directory store backed by a Redis-over-HTTP endpoint.
#[derive(Debug, Clone)]
pub struct RestDirectoryStore {
    client: Client,
    url: String,
    token: String,
}

impl RestDirectoryStore {
    /// Creates a store client sharing an existing HTTP client.
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client (reused for connection pooling)
    /// * `url` - Base URL of the store's REST endpoint
    /// * `token` - Bearer token for authentication
    pub fn new(client: Client, url: String, token: String) -> Self {
        Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Returns the store URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn command(&self, args: &[&str]) -> Result<serde_json::Value> {
        let verb = args.first().copied().unwrap_or_default();

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(args)
            .send()
            .await
            .with_context(|| format!("Directory store {verb} request failed"))?;

        let status = response.status();
        log::debug!("[DirectoryStore] {} -> HTTP {}", verb, status.as_u16());
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Directory store {verb} failed (HTTP {status}): {body}");
        }

        let parsed: CommandResponse = response
            .json()
            .await
            .with_context(|| format!("Invalid directory store {verb} response"))?;

        if let Some(error) = parsed.error {
            anyhow::bail!("Directory store {verb} error: {error}");
        }

        Ok(parsed.result)
    }
}

#[async_trait]
impl DirectoryStore for RestDirectoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self.command(&["GET", key]).await?;
        Ok(match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            // Some backends hand back already-decoded JSON
            other => Some(other.to_string()),
        })
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.command(&["SET", key, value]).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<u64> {
        let value = self.command(&["DEL", key]).await?;
        Ok(value.as_u64().unwrap_or(0))
    }
}
