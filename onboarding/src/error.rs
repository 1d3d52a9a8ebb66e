//! Error types for the onboarding pipeline.
//!
//! Row-level problems (bad email, missing name, ...) are never errors in this
//! sense: the parser returns them as data. The types here cover everything
//! that stops an operation as a whole:
//!
//! - [`CsvError`] - reading or decoding the source file
//! - [`ApiError`] - talking to the employee API
//! - [`ImportError`] - the batch import path failed as a whole
//! - [`PolicyError`] - a cost-center policy is not acceptable
//! - [`ConfigError`] - environment configuration
//! - [`ServerError`] - HTTP service errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// CSV Source Errors
// =============================================================================

/// Errors while reading the CSV source.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Content could not be decoded.
    #[error("Failed to decode content as {encoding}: {message}")]
    Encoding { encoding: String, message: String },
}

// =============================================================================
// Employee API Errors
// =============================================================================

/// Errors from the employee API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or connection failure.
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// Request exceeded the client timeout.
    #[error("Request timed out")]
    Timeout,

    /// Server answered with a non-success status.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// Response body could not be decoded.
    #[error("Invalid response: {0}")]
    Decode(String),

    /// Request abandoned because the import was cancelled.
    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    /// HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the endpoint itself is missing (404) or not implemented (501).
    pub fn is_endpoint_missing(&self) -> bool {
        matches!(self.status(), Some(404) | Some(501))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

// =============================================================================
// Import Errors
// =============================================================================

/// Errors from the import executor.
///
/// Only the batch path produces these; the sequential path records failures
/// per row instead.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The batch call failed as a whole.
    #[error("Batch import failed: {0}")]
    Batch(#[from] ApiError),
}

// =============================================================================
// Policy Errors
// =============================================================================

/// Reasons a cost-center policy is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Select at least one allowed category")]
    NoCategories,

    #[error("Spending limit per ride must be greater than zero")]
    InvalidSpendingLimit,

    #[error("Business hours need both a start and an end time")]
    MissingBusinessHours,

    #[error("Invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("Business hours start and end cannot be equal")]
    EmptyBusinessWindow,
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but its value is unusable.
    #[error("Invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP service errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration error at startup.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Failed to bind or serve.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV source operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for employee API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type for the batch import path.
pub type BatchResult<T> = Result<T, ImportError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let api_err = ApiError::Status {
            status: 404,
            message: "Not Found".into(),
        };
        let import_err: ImportError = api_err.into();
        assert!(import_err.to_string().contains("Not Found"));
    }

    #[test]
    fn test_status_message_is_displayed_verbatim() {
        let err = ApiError::Status {
            status: 400,
            message: "Email already registered".into(),
        };
        assert_eq!(err.to_string(), "Email already registered");
        assert_eq!(err.status(), Some(400));
        assert!(!err.is_endpoint_missing());
    }

    #[test]
    fn test_endpoint_missing() {
        for status in [404, 501] {
            let err = ApiError::Status {
                status,
                message: String::new(),
            };
            assert!(err.is_endpoint_missing());
        }
        assert!(!ApiError::Timeout.is_endpoint_missing());
    }

    #[test]
    fn test_policy_error_format() {
        let err = PolicyError::InvalidTime("25:99".into());
        assert!(err.to_string().contains("25:99"));
    }
}
