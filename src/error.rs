//! Error types for pkgcheck
//!
//! This module provides error handling for the library, including:
//! - Batch-level error types (configuration, network, upstream payloads)
//! - HTTP status code mapping for the API surface
//! - Structured error responses with machine-readable error codes
//!
//! Per-package failures are deliberately absent here: the reconciler turns
//! them into record data and they never propagate as [`Error`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::BatchId;

/// Result type alias for pkgcheck operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pkgcheck
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "search.max_concurrent")
        key: Option<String>,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An upstream data source misbehaved
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Package manifest could not be read
    #[error("invalid manifest: {0}")]
    Manifest(String),

    /// Caller supplied unusable input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A newer batch replaced this one before it finished
    #[error("batch {batch} was superseded by a newer request")]
    Superseded {
        /// The batch whose results were discarded
        batch: BatchId,
    },

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Errors raised by the remote data sources
#[derive(Debug, Error)]
pub enum SourceError {
    /// Upstream answered with a non-success status
    #[error("{source_name} returned HTTP {status}")]
    HttpStatus {
        /// Which source answered
        source_name: &'static str,
        /// The HTTP status code
        status: u16,
    },

    /// Upstream answered, but not with the expected shape
    #[error("malformed {source_name} payload: {reason}")]
    MalformedPayload {
        /// Which source answered
        source_name: &'static str,
        /// What was wrong with the payload
        reason: String,
    },

    /// Upstream did not answer within the configured timeout
    #[error("{source_name} timed out")]
    Timeout {
        /// Which source timed out
        source_name: &'static str,
    },

    /// A link supplied by a source could not be parsed
    #[error("invalid link {url:?}: {reason}")]
    InvalidLink {
        /// The offending URL text
        url: String,
        /// Parser message
        reason: String,
    },
}

impl SourceError {
    /// Shorthand for a malformed payload error
    pub fn malformed(source_name: &'static str, reason: impl Into<String>) -> Self {
        SourceError::MalformedPayload {
            source_name,
            reason: reason.into(),
        }
    }
}

/// API error response format
///
/// ```json
/// {
///   "error": {
///     "code": "upstream_unavailable",
///     "message": "source error: directory snapshot returned HTTP 503",
///     "details": { "status": 503 }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "invalid_input")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 500,
            Error::InvalidInput(_) => 400,
            Error::Manifest(_) => 422,
            Error::Superseded { .. } => 409,

            Error::Network(e) if e.is_timeout() => 504,
            Error::Network(_) => 502,
            Error::Source(SourceError::Timeout { .. }) => 504,
            Error::Source(_) => 502,

            Error::Serialization(_) => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::Io(_) => "io_error",
            Error::Source(e) => match e {
                SourceError::HttpStatus { .. } => "upstream_unavailable",
                SourceError::MalformedPayload { .. } => "upstream_malformed",
                SourceError::Timeout { .. } => "upstream_timeout",
                SourceError::InvalidLink { .. } => "invalid_link",
            },
            Error::Manifest(_) => "invalid_manifest",
            Error::InvalidInput(_) => "invalid_input",
            Error::Superseded { .. } => "superseded",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({ "key": key })),
            Error::Source(SourceError::HttpStatus {
                source_name,
                status,
            }) => Some(serde_json::json!({
                "source": source_name,
                "status": status,
            })),
            Error::Source(SourceError::MalformedPayload { source_name, .. })
            | Error::Source(SourceError::Timeout { source_name }) => {
                Some(serde_json::json!({ "source": source_name }))
            }
            Error::Superseded { batch } => Some(serde_json::json!({ "batch_id": batch.get() })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
