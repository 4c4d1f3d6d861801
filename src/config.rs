//! Configuration loading and persistence.
//!
//! Handles reading and writing the miniapp-notify configuration file.
//! The directory store token is never written to disk; it comes from the
//! environment only.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::time::Duration;
use std::{fs, path::PathBuf};

use crate::constants;
use crate::dispatch::BatchGrouping;

/// Configuration for the notification core.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Config {
    /// REST URL of the directory store. `None` disables the directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory_url: Option<String>,
    /// Directory store token - NOT serialized to disk (env only).
    #[serde(skip)]
    pub directory_token: String,
    /// Namespace prefix for directory keys.
    #[serde(default = "default_prefix")]
    pub directory_prefix: String,
    /// Timeout in seconds for each outbound HTTP request.
    #[serde(default = "default_timeout")]
    pub http_timeout_secs: u64,
    /// How batch items sharing an endpoint are combined.
    #[serde(default)]
    pub batch_grouping: BatchGrouping,
}

fn default_prefix() -> String {
    constants::DEFAULT_DIRECTORY_PREFIX.to_string()
}

fn default_timeout() -> u64 {
    constants::HTTP_REQUEST_TIMEOUT.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory_url: None,
            directory_token: String::new(),
            directory_prefix: default_prefix(),
            http_timeout_secs: default_timeout(),
            batch_grouping: BatchGrouping::default(),
        }
    }
}

impl Config {
    /// Returns the configuration directory path, creating it if necessary.
    ///
    /// `MINIAPP_NOTIFY_CONFIG_DIR` overrides the platform config dir.
    pub fn config_dir() -> Result<PathBuf> {
        let dir = if let Ok(dir) = std::env::var("MINIAPP_NOTIFY_CONFIG_DIR") {
            PathBuf::from(dir)
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join(constants::APP_NAME)
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config dir {}", dir.display()))?;
        Ok(dir)
    }

    /// Loads configuration from file, with environment variable overrides.
    ///
    /// A missing or unreadable file falls back to defaults. A zero timeout
    /// from either source is replaced by the default.
    pub fn load() -> Result<Self> {
        let mut config = match Self::load_from_file() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Using default config: {:#}", e);
                Self::default()
            }
        };
        if config.http_timeout_secs == 0 {
            log::warn!(
                "Ignoring http_timeout_secs = 0 in config file, using {}s",
                default_timeout()
            );
            config.http_timeout_secs = default_timeout();
        }
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_from_file() -> Result<Self> {
        let config_path = Self::config_dir()?.join("config.json");
        if !config_path.exists() {
            anyhow::bail!("Config file not found");
        }
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("MINIAPP_NOTIFY_DIRECTORY_URL") {
            self.directory_url = Some(url);
        }

        if let Ok(token) = std::env::var("MINIAPP_NOTIFY_DIRECTORY_TOKEN") {
            self.directory_token = token;
        }

        if let Ok(prefix) = std::env::var("MINIAPP_NOTIFY_PREFIX") {
            self.directory_prefix = prefix;
        }

        if let Ok(timeout) = std::env::var("MINIAPP_NOTIFY_HTTP_TIMEOUT") {
            match timeout.parse::<u64>() {
                Ok(secs) if secs > 0 => self.http_timeout_secs = secs,
                _ => log::warn!("Ignoring MINIAPP_NOTIFY_HTTP_TIMEOUT: {:?}", timeout),
            }
        }

        if let Ok(grouping) = std::env::var("MINIAPP_NOTIFY_BATCH_GROUPING") {
            match grouping.parse() {
                Ok(grouping) => self.batch_grouping = grouping,
                Err(e) => log::warn!("Ignoring MINIAPP_NOTIFY_BATCH_GROUPING: {}", e),
            }
        }
    }

    /// Persists the current configuration to disk.
    /// Note: the directory token is NOT saved.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_dir()?.join("config.json");
        fs::write(&config_path, serde_json::to_string_pretty(self)?)?;

        // Set restrictive permissions (owner read/write only)
        #[cfg(unix)]
        fs::set_permissions(&config_path, fs::Permissions::from_mode(0o600))?;

        Ok(())
    }

    /// Store URL and token, if both are configured.
    ///
    /// Missing either one disables the directory rather than failing startup.
    pub fn directory_credentials(&self) -> Option<(&str, &str)> {
        match self.directory_url.as_deref() {
            Some(url) if !url.is_empty() && !self.directory_token.is_empty() => {
                Some((url, self.directory_token.as_str()))
            }
            _ => None,
        }
    }

    /// Request timeout for the shared HTTP client.
    ///
    /// Never zero: an unset (`0`) value means the default.
    pub fn http_timeout(&self) -> Duration {
        match self.http_timeout_secs {
            0 => constants::HTTP_REQUEST_TIMEOUT,
            secs => Duration::from_secs(secs),
        }
    }
}
