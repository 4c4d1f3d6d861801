//! Miniapp Notify - notification directory and push dispatch engine.
//!
//! Resolves a recipient (numeric account id, or delivery token + endpoint)
//! to its registered push-delivery endpoint and delivers single or batched
//! notifications there, classifying each token as delivered, invalid, or
//! rate limited.
//!
//! # Architecture
//!
//! - **Directory** - Key resolver and validating accessor over a key-value store
//! - **Dispatcher** - Single and batched delivery to registered endpoints
//! - **Config** - File + environment configuration
//!
//! # Modules
//!
//! - [`directory`] - Recipient identities, records, and store backends
//! - [`dispatch`] - Delivery requests, outcomes, and batching
//! - [`config`] - Configuration loading/saving
//! - [`error`] - Error taxonomy

pub mod config;
pub mod constants;
pub mod directory;
pub mod dispatch;
pub mod error;

// Re-export commonly used types
pub use config::Config;
pub use directory::{Directory, DirectoryRecord, DirectoryStore, RecipientIdentity};
pub use dispatch::{BatchGrouping, DeliveryOutcome, Dispatcher, Notification};
pub use error::{DeliveryError, NotifyError};
