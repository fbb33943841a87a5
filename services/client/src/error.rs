//! services/client/src/error.rs
//!
//! Defines the primary error type for the client service.

use crate::config::ConfigError;
use crate::i18n::{self, Language};
use educonnect_core::ports::PortError;
use educonnect_core::reminder::ValidationError;

/// How a failure should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Blocks submission and is shown inline. Never sent to the server.
    Validation,
    /// Bad credentials or an expired session. Other app state is kept.
    Auth,
    /// Transient; the action stays re-attemptable by the user.
    Network,
    /// The referenced resource is gone; callers navigate to a parent view.
    NotFound,
    Other,
}

/// The primary error type for the `client` service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// A client-side check rejected the input before any request was sent.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A cached value could not be encoded or decoded.
    #[error("Storage encoding error: {0}")]
    Storage(#[from] serde_json::Error),

    /// Represents a standard Input/Output error (e.g., reading the state file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The same action is already in flight.
    #[error("A request for this action is already in progress")]
    Busy,

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ClientError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ClientError::Validation(_) => ErrorCategory::Validation,
            ClientError::Port(PortError::Unauthorized(_)) => ErrorCategory::Auth,
            ClientError::Port(PortError::Network(_)) => ErrorCategory::Network,
            ClientError::Port(PortError::NotFound(_)) => ErrorCategory::NotFound,
            _ => ErrorCategory::Other,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Port(e) if e.is_retryable())
    }

    /// The text to show the user, passed through the translation layer.
    pub fn user_message(&self, language: Language) -> String {
        match self {
            ClientError::Port(PortError::Network(_)) => {
                i18n::network_failure(language).to_string()
            }
            ClientError::Port(PortError::Unauthorized(msg))
            | ClientError::Port(PortError::NotFound(msg))
            | ClientError::Port(PortError::Rejected { message: msg, .. }) => {
                i18n::translate(msg, language)
            }
            other => i18n::translate(&other.to_string(), language),
        }
    }
}
