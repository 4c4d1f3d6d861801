//! Notification dispatch to registered delivery endpoints.
//!
//! The [`Dispatcher`] looks recipients up in the [`Directory`], POSTs a
//! [`DeliveryRequest`] to the endpoint each recipient registered, and
//! returns the endpoint's per-token [`DeliveryOutcome`].
//!
//! # Flow
//!
//! ```text
//! caller
//!     ↓ send / send_batch
//! Dispatcher ──get──▶ Directory ──▶ DirectoryStore
//!     ↓ POST {notificationId, title, body, targetUrl, tokens}
//! delivery endpoint
//!     ↓ {successfulTokens, invalidTokens, rateLimitedTokens}
//! caller
//! ```
//!
//! # Failure policy
//!
//! Internally every attempt yields `Result<DeliveryOutcome, DeliveryError>`.
//! At the public boundary only malformed input ([`NotifyError`]) is
//! returned as an error. Unregistered recipients, directory outages and
//! endpoint failures are logged and reported as `Ok(None)`, so a flow that
//! fires a notification as a side effect never fails because of it.
//! Nothing is retried.

// Rust guideline compliant 2026-02

pub mod batch;
pub mod types;

use reqwest::{Client, Response};
use std::sync::Arc;

pub use batch::{BatchGrouping, BatchReport, GroupFailure};
pub use types::{DeliveryOutcome, DeliveryRequest, Notification};

use crate::config::Config;
use crate::constants::MAX_OUTCOME_BODY_BYTES;
use crate::directory::{Directory, DirectoryStore, RecipientIdentity, RestDirectoryStore};
use crate::error::{DeliveryError, NotifyError};

/// Sends notifications to the endpoints recorded in the directory.
///
/// Holds no per-call state; one instance can serve any number of
/// concurrent calls. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    directory: Arc<Directory>,
    client: Client,
    grouping: BatchGrouping,
}

impl Dispatcher {
    /// Creates a dispatcher over a shared directory.
    ///
    /// # Arguments
    ///
    /// * `directory` - Directory used to resolve recipients
    /// * `client` - HTTP client (reused for connection pooling)
    pub fn new(directory: Arc<Directory>, client: Client) -> Self {
        Self {
            directory,
            client,
            grouping: BatchGrouping::default(),
        }
    }

    /// Build the process-wide dispatcher from configuration.
    ///
    /// Creates one HTTP client (shared by the directory store and delivery
    /// requests). Without store credentials the directory is disabled and
    /// every send reports "no notification sent".
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.http_timeout()).build()?;

        let directory = match config.directory_credentials() {
            Some((url, token)) => {
                let store: Arc<dyn DirectoryStore> = Arc::new(RestDirectoryStore::new(
                    client.clone(),
                    url.to_string(),
                    token.to_string(),
                ));
                Directory::new(store, config.directory_prefix.clone())
            }
            None => {
                log::warn!("[Dispatch] Directory store not configured; notifications disabled");
                Directory::disabled(config.directory_prefix.clone())
            }
        };

        Ok(Self::new(Arc::new(directory), client).with_grouping(config.batch_grouping))
    }

    /// Sets how batch items are grouped into requests.
    pub fn with_grouping(mut self, grouping: BatchGrouping) -> Self {
        self.grouping = grouping;
        self
    }

    /// The directory this dispatcher reads from.
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Batch grouping policy in effect.
    pub fn grouping(&self) -> BatchGrouping {
        self.grouping
    }

    /// Send one notification to one recipient.
    ///
    /// Returns `Ok(None)` when nothing was delivered: the recipient is not
    /// registered, the directory is down, or the endpoint failed.
    ///
    /// # Errors
    ///
    /// [`NotifyError::InvalidIdentity`] for a malformed recipient.
    pub async fn send(
        &self,
        notification: &Notification,
    ) -> Result<Option<DeliveryOutcome>, NotifyError> {
        match self.try_send(notification).await {
            Ok(outcome) => Ok(Some(outcome)),
            Err(DeliveryError::Input(e)) => Err(e),
            Err(DeliveryError::NotRegistered) => Ok(None),
            Err(e) => {
                log::warn!("[Dispatch] Notification not delivered: {}", e);
                Ok(None)
            }
        }
    }

    /// Convenience form of [`send`](Self::send) taking the fields directly.
    pub async fn send_one(
        &self,
        recipient: RecipientIdentity,
        title: &str,
        body: &str,
        target_url: &str,
        notification_id: Option<&str>,
    ) -> Result<Option<DeliveryOutcome>, NotifyError> {
        let mut notification = Notification::new(recipient, title, body, target_url);
        notification.notification_id = notification_id.map(String::from);
        self.send(&notification).await
    }

    /// Send one notification, reporting exactly why nothing was delivered.
    pub async fn try_send(
        &self,
        notification: &Notification,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        let record = self
            .directory
            .get(&notification.recipient)
            .await?
            .ok_or(DeliveryError::NotRegistered)?;

        let request = DeliveryRequest::for_notification(notification, vec![record.delivery_token]);
        log::debug!(
            "[Dispatch] Sending notification {} to {}",
            request.notification_id,
            record.endpoint_url
        );

        self.post(&record.endpoint_url, &request).await
    }

    /// POST `request` to `endpoint` and decode the outcome.
    pub(crate) async fn post(
        &self,
        endpoint: &str,
        request: &DeliveryRequest,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        let response = self.client.post(endpoint).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!(
                "[Dispatch] Endpoint {} rejected notification {} (HTTP {}): {}",
                endpoint,
                request.notification_id,
                status.as_u16(),
                body
            );
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = read_capped(response, MAX_OUTCOME_BODY_BYTES).await?;
        let outcome: DeliveryOutcome = serde_json::from_slice(&bytes)?;
        log::info!(
            "[Dispatch] Notification {} delivered to {}: {} ok, {} invalid, {} rate limited",
            request.notification_id,
            endpoint,
            outcome.successful_tokens.len(),
            outcome.invalid_tokens.len(),
            outcome.rate_limited_tokens.len()
        );
        Ok(outcome)
    }
}

/// Read a response body, giving up once it grows past `limit` bytes.
async fn read_capped(mut response: Response, limit: usize) -> Result<Vec<u8>, DeliveryError> {
    let too_large = DeliveryError::BodyTooLarge { limit };
    if response
        .content_length()
        .is_some_and(|len| len > limit as u64)
    {
        return Err(too_large);
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > limit {
            return Err(too_large);
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
