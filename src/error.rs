//! Error types for the account holder cache
//!
//! Only validation and not-found failures are meant to be told apart by
//! callers. Everything else collapses into a generic server error at the
//! request boundary (see [`Error::status_code`]).

use thiserror::Error;

/// Main error type for cache and upstream operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid paging parameters
    #[error("Invalid page request (page={page}, size={size}): {reason}")]
    InvalidRequest { page: i64, size: i64, reason: String },

    /// Identifier unknown to the upstream service
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport or server failure of an upstream call
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Convert to HTTP status code equivalent
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidRequest { .. } => 400,
            Error::NotFound(_) => 404,
            _ => 500,
        }
    }

    /// Whether the caller caused this error
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidRequest { .. })
    }

    pub(crate) fn invalid(page: i64, size: i64, reason: impl Into<String>) -> Self {
        Error::InvalidRequest {
            page,
            size,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = Error::Upstream("connection reset".to_string());
        assert_eq!(error.to_string(), "Upstream error: connection reset");

        let invalid = Error::invalid(-1, 10, "page must not be negative");
        assert!(invalid.to_string().contains("page=-1"));
        assert!(invalid.to_string().contains("must not be negative"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::invalid(0, 0, "size").status_code(), 400);
        assert_eq!(Error::NotFound("AH1".to_string()).status_code(), 404);
        assert_eq!(Error::Upstream("x".to_string()).status_code(), 500);
        assert_eq!(Error::Internal("x".to_string()).status_code(), 500);
        assert!(Error::invalid(0, 0, "size").is_client_error());
        assert!(!Error::NotFound("AH1".to_string()).is_client_error());
    }

    #[test]
    fn test_serde_conversion() {
        let err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let error: Error = err.into();
        assert!(matches!(error, Error::Serialization(_)));
    }
}
