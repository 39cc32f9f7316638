//! Unified error system for Tideline
//!
//! A single error type shared by every layer. Unresolved data is never an
//! error: derivations suspend instead. Errors describe operations that
//! actually failed (a page fetch, a malformed event, a bad config value).

use serde::{Deserialize, Serialize};

/// Unified error type for all Tideline operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum TidelineError {
    /// Invalid input or request (e.g. a negative page)
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// Remote service or transport failure
    #[error("Network error: {message}")]
    Network {
        /// Error message describing the network issue
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Configuration could not be loaded or failed validation
    #[error("Config error: {message}")]
    Config {
        /// Error message describing the configuration problem
        message: String,
    },

    /// Operation was superseded or its owner was torn down
    #[error("Cancelled: {message}")]
    Cancelled {
        /// Error message describing what was cancelled
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl TidelineError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a cancellation error
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::Cancelled {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Cancelled { .. })
    }
}

/// Standard Result type for Tideline operations
pub type Result<T> = std::result::Result<T, TidelineError>;

impl From<serde_json::Error> for TidelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<toml::de::Error> for TidelineError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}

impl From<std::io::Error> for TidelineError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}

impl From<futures::future::Aborted> for TidelineError {
    fn from(_: futures::future::Aborted) -> Self {
        Self::cancelled("task aborted")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = TidelineError::invalid("page -1");
        assert!(matches!(err, TidelineError::Invalid { .. }));
        assert_eq!(err.to_string(), "Invalid: page -1");
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = TidelineError::from(io_err);
        assert!(matches!(err, TidelineError::NotFound { .. }));

        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(matches!(
            TidelineError::from(json_err),
            TidelineError::Serialization { .. }
        ));
    }

    #[test]
    fn test_transient_classification() {
        assert!(TidelineError::network("timeout").is_transient());
        assert!(!TidelineError::invalid("bad").is_transient());
        assert!(!TidelineError::config("bad").is_transient());
    }
}
