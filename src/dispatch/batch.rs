//! Batched delivery: many recipients, one request per endpoint group.
//!
//! A batch call walks through these stages and keeps no state afterwards:
//!
//! ```text
//! Validating → Resolving → Grouping → Dispatching (×N groups) → Aggregating
//! ```
//!
//! Recipients without a directory entry are dropped. Survivors are grouped
//! (see [`BatchGrouping`]) and every group is sent as a single request
//! carrying all of its tokens. Groups are dispatched one after another; a
//! failing group is logged and skipped while the rest carry on.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use super::types::{DeliveryOutcome, DeliveryRequest, Notification};
use super::Dispatcher;
use crate::constants::MAX_BATCH_SIZE;
use crate::directory::resolve_key;
use crate::error::{DeliveryError, NotifyError};

/// How batch items sharing an endpoint are combined into requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchGrouping {
    /// One request per endpoint. The first item's title, body, target URL
    /// and id stand in for every item of the group.
    #[default]
    Endpoint,
    /// One request per endpoint and message. Items only share a request
    /// when their title, body and target URL are identical.
    EndpointAndMessage,
}

impl FromStr for BatchGrouping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "endpoint" => Ok(Self::Endpoint),
            "endpoint_and_message" => Ok(Self::EndpointAndMessage),
            other => Err(format!("unknown batch grouping: {other}")),
        }
    }
}

/// A group that produced no outcome.
#[derive(Debug)]
pub struct GroupFailure {
    /// Endpoint the group was addressed to.
    pub endpoint: String,
    /// Number of tokens in the group.
    pub tokens: usize,
    /// Why it failed.
    pub error: DeliveryError,
}

/// Detailed result of a batch call.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Merged outcome of every delivered group.
    pub outcome: DeliveryOutcome,
    /// Groups whose endpoint answered with an outcome.
    pub delivered_groups: usize,
    /// Groups skipped because their request failed.
    pub failed_groups: Vec<GroupFailure>,
    /// Items dropped because the recipient had no directory entry.
    pub unregistered: usize,
}

impl BatchReport {
    /// Collapse to the public result: `None` if no group was delivered.
    pub fn into_outcome(self) -> Option<DeliveryOutcome> {
        (self.delivered_groups > 0).then_some(self.outcome)
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct GroupKey<'a> {
    endpoint: String,
    message: Option<(&'a str, &'a str, &'a str)>,
}

#[derive(Debug)]
struct Group<'a> {
    endpoint: String,
    first: &'a Notification,
    tokens: Vec<String>,
}

impl Dispatcher {
    /// Deliver up to [`MAX_BATCH_SIZE`] notifications.
    ///
    /// Returns `Ok(None)` when no group was delivered (including an empty
    /// batch); otherwise the merged outcome of every delivered group.
    ///
    /// # Errors
    ///
    /// [`NotifyError::BatchTooLarge`] before any lookup when more than
    /// [`MAX_BATCH_SIZE`] items are given; [`NotifyError::InvalidIdentity`]
    /// if any item has a malformed recipient.
    pub async fn send_batch(
        &self,
        items: &[Notification],
    ) -> Result<Option<DeliveryOutcome>, NotifyError> {
        Ok(self.dispatch_batch(items).await?.into_outcome())
    }

    /// Deliver a batch and report per-group results.
    pub async fn dispatch_batch(&self, items: &[Notification]) -> Result<BatchReport, NotifyError> {
        if items.len() > MAX_BATCH_SIZE {
            return Err(NotifyError::BatchTooLarge {
                len: items.len(),
                max: MAX_BATCH_SIZE,
            });
        }
        for item in items {
            resolve_key(self.directory.prefix(), &item.recipient)?;
        }

        let mut report = BatchReport::default();
        if items.is_empty() {
            return Ok(report);
        }

        let mut groups: Vec<Group<'_>> = Vec::new();
        let mut index: HashMap<GroupKey<'_>, usize> = HashMap::new();

        for item in items {
            let Some(record) = self.directory.get(&item.recipient).await? else {
                report.unregistered += 1;
                continue;
            };

            let key = GroupKey {
                endpoint: record.endpoint_url.clone(),
                message: match self.grouping {
                    BatchGrouping::Endpoint => None,
                    BatchGrouping::EndpointAndMessage => Some((
                        item.title.as_str(),
                        item.body.as_str(),
                        item.target_url.as_str(),
                    )),
                },
            };

            let slot = *index.entry(key).or_insert_with(|| {
                groups.push(Group {
                    endpoint: record.endpoint_url.clone(),
                    first: item,
                    tokens: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].tokens.push(record.delivery_token);
        }

        log::info!(
            "[Batch] {} items → {} groups ({} unregistered)",
            items.len(),
            groups.len(),
            report.unregistered
        );

        for group in groups {
            match self.dispatch_group(&group).await {
                Ok(outcome) => {
                    report.outcome.merge(outcome);
                    report.delivered_groups += 1;
                }
                Err(DeliveryError::Input(e)) => return Err(e),
                Err(error) => {
                    log::warn!(
                        "[Batch] Group for {} ({} tokens) skipped: {}",
                        group.endpoint,
                        group.tokens.len(),
                        error
                    );
                    report.failed_groups.push(GroupFailure {
                        endpoint: group.endpoint,
                        tokens: group.tokens.len(),
                        error,
                    });
                }
            }
        }

        log::info!(
            "[Batch] Done: {} groups delivered, {} failed, {} outcome entries",
            report.delivered_groups,
            report.failed_groups.len(),
            report.outcome.len()
        );
        Ok(report)
    }

    async fn dispatch_group(&self, group: &Group<'_>) -> Result<DeliveryOutcome, DeliveryError> {
        // The entry may have been removed or moved since grouping
        let fresh = self
            .directory
            .get(&group.first.recipient)
            .await?
            .ok_or(DeliveryError::NotRegistered)?;

        if fresh.endpoint_url != group.endpoint {
            log::info!(
                "[Batch] Endpoint for group moved from {} to {}",
                group.endpoint,
                fresh.endpoint_url
            );
        }

        let request = DeliveryRequest::for_notification(group.first, group.tokens.clone());
        self.post(&fresh.endpoint_url, &request).await
    }
}
