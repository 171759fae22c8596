//! Domain error types
//!
//! This module defines the error hierarchy for Argus. All errors are
//! domain-specific and don't expose third-party types.

use crate::domain::job::JobStatus;
use thiserror::Error;

/// Main Argus error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum ArgusError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid caller input (missing or unknown connection id, malformed request)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// NER service errors
    #[error("NER service error: {0}")]
    Ner(#[from] NerError),

    /// Engine-level detection failure (not a single strategy's failure)
    #[error("PII detection error: {0}")]
    Detection(String),

    /// Quasi-identifier analysis errors
    #[error("Quasi-identifier analysis error: {0}")]
    QuasiIdentifier(String),

    /// Report assembly or persistence errors
    #[error("Report generation error: {0}")]
    Report(String),

    /// Job not found in the store
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Rejected job state transition; the job is left unchanged
    #[error("Illegal state transition: {from} -> {to}")]
    IllegalStateTransition { from: JobStatus, to: JobStatus },

    /// Repository / persistence errors
    #[error("Repository error: {0}")]
    Repository(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Database-specific errors
///
/// Errors that occur when connecting to or reading from scanned databases.
/// These errors don't expose driver types.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to open or use a connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Unknown connection id
    #[error("Unknown connection: {0}")]
    UnknownConnection(String),

    /// Schema metadata extraction failed
    #[error("Metadata extraction failed: {0}")]
    MetadataExtraction(String),

    /// Column sampling failed non-recoverably
    #[error("Sampling failed: {0}")]
    Sampling(String),

    /// SQL statement failed
    #[error("SQL error: {0}")]
    Sql(String),

    /// Connection pool exhausted or timed out
    #[error("Connection pool error: {0}")]
    Pool(String),
}

/// NER service-specific errors
///
/// Errors from the remote named-entity-recognition service. The service is an
/// optional collaborator; callers degrade to an empty result instead of
/// propagating most of these.
#[derive(Debug, Error)]
pub enum NerError {
    /// Failed to reach the service
    #[error("Failed to connect to NER service: {0}")]
    ConnectionFailed(String),

    /// Service marked unavailable (failed liveness probe or previous error)
    #[error("NER service unavailable: {0}")]
    Unavailable(String),

    /// Non-success HTTP status
    #[error("NER service error: {status} - {message}")]
    Status { status: u16, message: String },

    /// Endpoint not found; never retried
    #[error("NER service endpoint not found: {0}")]
    NotFound(String),

    /// Per-call timeout elapsed
    #[error("NER request timeout: {0}")]
    Timeout(String),

    /// Response body did not match the expected shape
    #[error("Invalid NER response: {0}")]
    InvalidResponse(String),
}

impl NerError {
    /// Transient errors are retried with a fixed delay; 404 is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NotFound(_) | Self::Unavailable(_) => false,
            Self::Status { status, .. } => *status >= 500,
            Self::ConnectionFailed(_) | Self::Timeout(_) => true,
            Self::InvalidResponse(_) => false,
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for ArgusError {
    fn from(err: std::io::Error) -> Self {
        ArgusError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ArgusError {
    fn from(err: serde_json::Error) -> Self {
        ArgusError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ArgusError {
    fn from(err: toml::de::Error) -> Self {
        ArgusError::Configuration(format!("TOML parse error: {err}"))
    }
}
