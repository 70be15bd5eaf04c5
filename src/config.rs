//! Sync configuration with sensible defaults.
//!
//! [`SyncConfig`] controls where the reminder API lives, how often the
//! sync loop polls it, and the per-request timeout. The API base defaults
//! to the local development server and can be overridden through the
//! `REMINDER_API_BASE` environment variable.

use crate::error::SyncError;

/// Environment variable selecting the API base URL.
pub const API_BASE_ENV_VAR: &str = "REMINDER_API_BASE";

/// API base used when the environment variable is unset or empty.
pub const DEFAULT_API_BASE: &str = "http://localhost:5000";

/// Configuration for the sync loop and submission pipeline.
///
/// Use [`Default::default()`] for sensible defaults, [`SyncConfig::from_env`]
/// to pick up the API base from the environment, or construct with field
/// overrides for custom behaviour.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the reminder API, without a trailing slash.
    pub api_base: String,
    /// Seconds between periodic task-list fetches.
    pub poll_interval_secs: u64,
    /// Per-request HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            poll_interval_secs: 5,
            timeout_secs: 10,
        }
    }
}

impl SyncConfig {
    /// Build a config with the API base taken from `REMINDER_API_BASE`,
    /// falling back to [`DEFAULT_API_BASE`] when unset or empty.
    pub fn from_env() -> Self {
        let api_base = std::env::var(API_BASE_ENV_VAR)
            .ok()
            .map(|raw| raw.trim().trim_end_matches('/').to_owned())
            .filter(|base| !base.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_owned());
        Self {
            api_base,
            ..Self::default()
        }
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `api_base` must be non-empty and start with `http://` or `https://`
    /// - `poll_interval_secs` must be greater than 0
    /// - `timeout_secs` must be greater than 0
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.api_base.trim().is_empty() {
            return Err(SyncError::Config("api_base must not be empty".into()));
        }
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err(SyncError::Config(
                "api_base must start with http:// or https://".into(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(SyncError::Config(
                "poll_interval_secs must be greater than 0".into(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(SyncError::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
