// File: ./src/error.rs
//! Error taxonomy shared by the provider client, the synchronizer and the controller.
use thiserror::Error;

/// Errors surfaced at operation boundaries.
///
/// None of these are fatal: the controller turns each into a single
/// user-visible [`Notice`](crate::controller::Notice) and the user may retry.
#[derive(Error, Debug)]
pub enum TimelineError {
    /// Credential or list identifier missing (or unusable) when an operation was attempted.
    #[error("Configuration incomplete: {0}")]
    Config(String),

    /// The provider answered outside the 2xx range.
    #[error("Provider returned HTTP {status}")]
    Provider {
        /// HTTP status code of the response.
        status: u16,
        /// Response body, kept for logs.
        body: String,
    },

    /// The request could not be completed, or its response could not be read.
    #[error("Request could not be completed: {0}")]
    Transport(String),

    /// A required comment field was empty after trimming.
    #[error("Missing required field: {0}")]
    Validation(String),

    /// The local key-value store failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl TimelineError {
    /// Short kind name, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Provider { .. } => "provider",
            Self::Transport(_) => "transport",
            Self::Validation(_) => "validation",
            Self::Storage(_) => "storage",
        }
    }
}

impl From<anyhow::Error> for TimelineError {
    fn from(err: anyhow::Error) -> Self {
        Self::Storage(format!("{err:#}"))
    }
}

pub type Result<T> = std::result::Result<T, TimelineError>;
