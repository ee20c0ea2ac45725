use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level error surfaced to the console shell.
#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend rejected request: {0}")]
    Backend(String),

    #[error("Wallet probe failed: {0}")]
    Probe(String),

    #[error("Job polling failed: {0}")]
    Polling(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Broad classification used for routing errors to the right surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Inline next to a form field. Never leaves the client.
    Validation,
    /// Blocking wizard state, recoverable via retry.
    Submission,
    /// Warning only (probe failures, dropped polls).
    Advisory,
    /// Invalid or missing configuration.
    Config,
    System,
}

impl ConsoleError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::Config,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Network(_) | Self::Backend(_) => ErrorCategory::Submission,
            Self::Probe(_) | Self::Polling(_) => ErrorCategory::Advisory,
            Self::Internal(_) => ErrorCategory::System,
        }
    }

    /// Whether the error should put the UI into a blocking state.
    pub fn is_blocking(&self) -> bool {
        self.category() == ErrorCategory::Submission
    }

    /// Returns a user-facing message (hides internal details).
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(msg) => format!("Configuration issue: {msg}"),
            Self::Validation(msg) => msg.clone(),
            Self::Network(_) => "Network error. Check your connection and try again.".into(),
            Self::Backend(msg) => msg.clone(),
            Self::Probe(msg) => format!("Could not check wallet balance: {msg}"),
            Self::Polling(_) => "Lost contact with the deployment job. Still retrying.".into(),
            Self::Internal(_) => "An unexpected error occurred.".into(),
        }
    }
}
