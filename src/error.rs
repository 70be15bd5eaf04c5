//! Error types for the reminder-sync crate.
//!
//! All errors use stable string messages suitable for display to users.
//! [`SyncError::Api`] displays the server-provided message alone, so a UI
//! can surface a rejection like `{"error": "phone invalid"}` verbatim.

/// Errors that can occur while syncing or submitting tasks.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The HTTP request itself failed (connection refused, DNS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server rejected the request with a non-2xx status.
    ///
    /// `message` is the server's structured `error` field when present,
    /// otherwise a generic message embedding the status code.
    #[error("{message}")]
    Api {
        /// HTTP status code of the rejection.
        status: u16,
        /// Human-readable rejection message.
        message: String,
    },

    /// A draft task failed local validation before submission.
    #[error("invalid draft: {0}")]
    Validation(String),

    /// Invalid sync configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl SyncError {
    /// Build an [`SyncError::Api`] from a status code and optional server
    /// error body, falling back to a generic message embedding the status.
    pub fn api(status: u16, server_message: Option<String>) -> Self {
        let message = server_message.unwrap_or_else(|| format!("request failed ({status})"));
        Self::Api { status, message }
    }
}

/// Convenience type alias for reminder-sync results.
pub type Result<T> = std::result::Result<T, SyncError>;
