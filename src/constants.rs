//! Application-wide constants for miniapp-notify.
//!
//! Centralizes limits and defaults so the dispatcher, directory and
//! configuration layers agree on them.
//!
//! # Categories
//!
//! - **Timeouts**: Network timeouts
//! - **Limits**: Batch and logging bounds
//! - **Directory**: Key namespace defaults

use std::time::Duration;

// ============================================================================
// Timeouts
// ============================================================================

/// HTTP client request timeout for delivery and directory calls.
///
/// The core defines no timeout of its own; this bounds the worst-case stall
/// of a single POST to a delivery endpoint or the directory store.
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Limits
// ============================================================================

/// Maximum number of notifications accepted by a single batch call.
pub const MAX_BATCH_SIZE: usize = 100;

/// Largest delivery-outcome body read from an endpoint.
///
/// A full batch of tokens, each reported once, fits well below this.
pub const MAX_OUTCOME_BODY_BYTES: usize = 256 * 1024;

/// Upper bound on delivery-token characters kept when a key is written to logs.
pub const TOKEN_PREVIEW_LEN: usize = 8;

// ============================================================================
// Directory
// ============================================================================

/// Default namespace prefix for directory keys.
pub const DEFAULT_DIRECTORY_PREFIX: &str = "miniapp";

/// Application name used for the config directory.
pub const APP_NAME: &str = "miniapp-notify";
