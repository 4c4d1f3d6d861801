//! Recipient identities and their directory keys.
//!
//! A recipient is addressed either by a stable numeric id or, when no id is
//! known, directly by its delivery token and endpoint. Both map to a string
//! key under a caller-chosen namespace prefix:
//!
//! ```text
//! {prefix}:user:{id}
//! {prefix}:token:{token}:url:{endpoint}
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::TOKEN_PREVIEW_LEN;
use crate::error::NotifyError;

/// Caller-facing handle for a notification target.
///
/// Serialized untagged, so `{"id": 1001}` and
/// `{"token": "abc", "endpoint": "https://x/webhook"}` are both accepted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecipientIdentity {
    /// Stable recipient identifier.
    Id {
        /// Numeric account id.
        id: u64,
    },
    /// Direct delivery credential plus destination.
    Token {
        /// Delivery token.
        token: String,
        /// Delivery endpoint URL.
        endpoint: String,
    },
}

impl RecipientIdentity {
    /// Identity for a numeric recipient id.
    pub fn id(id: u64) -> Self {
        Self::Id { id }
    }

    /// Identity for a token+endpoint pair.
    pub fn token(token: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::Token {
            token: token.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Build an identity from optional parts. The id wins when present.
    ///
    /// # Errors
    ///
    /// [`NotifyError::InvalidIdentity`] if there is no id and the token or
    /// endpoint is missing or empty.
    pub fn from_parts(
        id: Option<u64>,
        token: Option<String>,
        endpoint: Option<String>,
    ) -> Result<Self, NotifyError> {
        if let Some(id) = id {
            return Ok(Self::Id { id });
        }
        match (token, endpoint) {
            (Some(token), Some(endpoint)) if !token.is_empty() && !endpoint.is_empty() => {
                Ok(Self::Token { token, endpoint })
            }
            _ => Err(NotifyError::InvalidIdentity),
        }
    }
}

/// Map an identity to its directory key under `prefix`.
///
/// Pure; performs no I/O.
///
/// # Errors
///
/// [`NotifyError::InvalidIdentity`] for a token identity with an empty
/// token or endpoint.
pub fn resolve_key(prefix: &str, identity: &RecipientIdentity) -> Result<String, NotifyError> {
    match identity {
        RecipientIdentity::Id { id } => Ok(format!("{prefix}:user:{id}")),
        RecipientIdentity::Token { token, endpoint } => {
            if token.is_empty() || endpoint.is_empty() {
                return Err(NotifyError::InvalidIdentity);
            }
            Ok(format!("{prefix}:token:{token}:url:{endpoint}"))
        }
    }
}

/// Same key as [`resolve_key`], with the delivery token cut to a preview.
///
/// Used for log lines only. Invalid identities render as `<invalid>`.
pub fn redacted_key(prefix: &str, identity: &RecipientIdentity) -> String {
    match identity {
        RecipientIdentity::Id { id } => format!("{prefix}:user:{id}"),
        RecipientIdentity::Token { token, endpoint }
            if !token.is_empty() && !endpoint.is_empty() =>
        {
            format!("{prefix}:token:{}:url:{endpoint}", token_preview(token))
        }
        RecipientIdentity::Token { .. } => format!("{prefix}:<invalid>"),
    }
}

/// First few characters of a token followed by an ellipsis.
///
/// At most half the token (and never more than [`TOKEN_PREVIEW_LEN`]
/// characters) is shown, so short tokens are never printed in full.
pub fn token_preview(token: &str) -> String {
    let keep = (token.chars().count() / 2).min(TOKEN_PREVIEW_LEN);
    let head: String = token.chars().take(keep).collect();
    format!("{head}…")
}
