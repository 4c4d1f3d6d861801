//! Error taxonomy for the notification core.
//!
//! Two layers:
//!
//! - [`NotifyError`] is returned to callers and only covers malformed input.
//! - [`DeliveryError`] describes I/O failures while delivering. The
//!   dispatcher logs these and collapses them to "no outcome" at its public
//!   boundary, so business flows never fail because notifications are down.

// Rust guideline compliant 2026-02

use thiserror::Error;

/// Malformed-input errors that propagate to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The identity carries neither an id nor a token+endpoint pair.
    #[error("invalid recipient identity: need an id or a non-empty token and endpoint")]
    InvalidIdentity,
    /// A directory record is missing its token or has an unusable URL.
    #[error("invalid directory record: {reason}")]
    InvalidRecord {
        /// What was wrong with the record.
        reason: String,
    },
    /// More notifications were submitted than a batch may carry.
    #[error("batch of {len} notifications exceeds the limit of {max}")]
    BatchTooLarge {
        /// Number of submitted items.
        len: usize,
        /// Configured maximum.
        max: usize,
    },
}

/// Why a delivery attempt produced no outcome.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The request itself was malformed. Always propagated to the caller.
    #[error(transparent)]
    Input(#[from] NotifyError),
    /// No directory entry exists for the recipient (or the directory is down).
    #[error("recipient has no directory entry")]
    NotRegistered,
    /// The request never got a response.
    #[error("delivery request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The endpoint answered with a non-2xx status.
    #[error("delivery endpoint returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// The endpoint's 2xx body exceeded the outcome size limit.
    #[error("delivery outcome body exceeds {limit} bytes")]
    BodyTooLarge {
        /// Size limit in bytes.
        limit: usize,
    },
    /// The endpoint answered 2xx but the body was not a delivery outcome.
    #[error("could not decode delivery outcome: {0}")]
    Decode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_too_large_message() {
        let err = NotifyError::BatchTooLarge { len: 101, max: 100 };
        assert_eq!(
            err.to_string(),
            "batch of 101 notifications exceeds the limit of 100"
        );
    }

    #[test]
    fn test_input_error_is_transparent() {
        let err = DeliveryError::from(NotifyError::InvalidIdentity);
        assert_eq!(err.to_string(), NotifyError::InvalidIdentity.to_string());
    }

    #[test]
    fn test_status_error_carries_body() {
        let err = DeliveryError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert!(err.to_string().contains("HTTP 500"));
        assert!(err.to_string().contains("boom"));
    }
}
