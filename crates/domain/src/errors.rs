//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for VaultWatch
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum VaultWatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VaultWatchError {
    /// Stable label for this error, suitable for structured logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Network(_) => "network",
            Self::Auth(_) => "auth",
            Self::Validation(_) => "validation",
            Self::Timeout(_) => "timeout",
            Self::Io(_) => "io",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for VaultWatch operations
pub type Result<T> = std::result::Result<T, VaultWatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_category_and_message() {
        let err = VaultWatchError::Auth("token expired".to_string());
        assert_eq!(err.to_string(), "Authentication error: token expired");
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(VaultWatchError::Config(String::new()).label(), "config");
        assert_eq!(VaultWatchError::Timeout(String::new()).label(), "timeout");
        assert_eq!(VaultWatchError::Validation(String::new()).label(), "validation");
    }
}
