//! Wire and request types for notification delivery.
//!
//! This module defines the JSON bodies exchanged with delivery endpoints
//! and the caller-facing notification request.

use serde::{Deserialize, Serialize};

use crate::directory::RecipientIdentity;

/// A notification addressed to one recipient.
///
/// Used both for single sends and as one item of a batch. The delivery
/// token is resolved from the directory, never supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Caller-supplied id; a UUID is generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<String>,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub body: String,
    /// URL opened when the notification is clicked.
    pub target_url: String,
    /// Who receives it.
    pub recipient: RecipientIdentity,
}

impl Notification {
    /// Creates a notification without an explicit id.
    pub fn new(
        recipient: RecipientIdentity,
        title: impl Into<String>,
        body: impl Into<String>,
        target_url: impl Into<String>,
    ) -> Self {
        Self {
            notification_id: None,
            title: title.into(),
            body: body.into(),
            target_url: target_url.into(),
            recipient,
        }
    }

    /// Sets the notification id.
    pub fn with_id(mut self, notification_id: impl Into<String>) -> Self {
        self.notification_id = Some(notification_id.into());
        self
    }
}

/// Body POSTed to a delivery endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRequest {
    /// Notification id (stable across retries by the caller).
    pub notification_id: String,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub body: String,
    /// Click-through URL.
    pub target_url: String,
    /// Delivery tokens addressed by this request.
    pub tokens: Vec<String>,
}

impl DeliveryRequest {
    /// Build the envelope for `notification`, generating an id if needed.
    pub fn for_notification(notification: &Notification, tokens: Vec<String>) -> Self {
        Self {
            notification_id: notification
                .notification_id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            title: notification.title.clone(),
            body: notification.body.clone(),
            target_url: notification.target_url.clone(),
            tokens,
        }
    }
}

/// Per-token classification returned by a delivery endpoint.
///
/// Missing buckets decode as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOutcome {
    /// Tokens the endpoint accepted.
    #[serde(default)]
    pub successful_tokens: Vec<String>,
    /// Tokens the endpoint no longer recognizes.
    #[serde(default)]
    pub invalid_tokens: Vec<String>,
    /// Tokens throttled by the endpoint.
    #[serde(default)]
    pub rate_limited_tokens: Vec<String>,
}

impl DeliveryOutcome {
    /// Append every bucket of `other` to this outcome.
    ///
    /// No deduplication: a token reported by two groups appears twice.
    pub fn merge(&mut self, other: DeliveryOutcome) {
        self.successful_tokens.extend(other.successful_tokens);
        self.invalid_tokens.extend(other.invalid_tokens);
        self.rate_limited_tokens.extend(other.rate_limited_tokens);
    }

    /// Total number of entries across all buckets.
    pub fn len(&self) -> usize {
        self.successful_tokens.len() + self.invalid_tokens.len() + self.rate_limited_tokens.len()
    }

    /// Whether every bucket is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
