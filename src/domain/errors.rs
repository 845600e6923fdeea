//! Domain error types
//!
//! This module defines the error hierarchy for the gateway. Errors are
//! domain-specific and don't expose third-party transport or parser types.

use super::transmission::FailureKind;
use thiserror::Error;

/// Main gateway error type
///
/// This is the primary error type used throughout the library. Conversion and
/// transmission boundaries translate it into structured result values, so it
/// mostly surfaces from configuration, audit and CLI code paths.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input validation errors (aggregated)
    #[error("Validation error: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// HL7 mapping/encoding errors
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Transmission errors
    #[error("Transmission error: {0}")]
    Transmission(#[from] TransmissionError),

    /// No provider registered for the requested protocol
    #[error("Unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    /// Audit repository errors
    #[error("Audit error: {0}")]
    Audit(String),

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

/// HL7 mapping and encoding errors
///
/// Raised while parsing ER7 text or assembling a message from the domain
/// model. A conversion that hits one of these never yields partial output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// Message is empty or contains only whitespace
    #[error("Message is empty")]
    EmptyMessage,

    /// First segment is not MSH
    #[error("Message must start with an MSH segment, found: {0}")]
    MissingMsh(String),

    /// Delimiter characters are malformed
    #[error("Invalid delimiter configuration: {0}")]
    InvalidDelimiters(String),

    /// A segment could not be parsed
    #[error("Invalid segment: {0}")]
    InvalidSegment(String),

    /// A field value could not be mapped
    #[error("Invalid field {field}: {message}")]
    InvalidField { field: String, message: String },
}

/// Transmission errors
///
/// Low-level transport failures are translated into these variants before
/// they reach a `TransmissionResult`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransmissionError {
    /// Attempt exceeded its timeout
    #[error("Transmission timed out after {0} seconds")]
    Timeout(u64),

    /// Network or protocol failure
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Cancellation was requested by the caller
    #[error("Transmission cancelled: {0}")]
    Cancelled(String),

    /// Receiver answered with a negative acknowledgment
    #[error("Message rejected by receiver: {0}")]
    Rejected(String),

    /// Endpoint is not valid for the selected protocol
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Message exceeds the configured size limit
    #[error("Message size {size} bytes exceeds limit of {limit} bytes")]
    MessageTooLarge { size: usize, limit: usize },
}

impl TransmissionError {
    /// Failure category recorded on the result and audit log
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            TransmissionError::Timeout(_) => FailureKind::Timeout,
            TransmissionError::Transport(_) => FailureKind::Transport,
            TransmissionError::Cancelled(_) => FailureKind::Cancelled,
            TransmissionError::Rejected(_) => FailureKind::Rejected,
            TransmissionError::InvalidEndpoint(_) | TransmissionError::MessageTooLarge { .. } => {
                FailureKind::InvalidRequest
            }
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for GatewayError {
    fn from(err: toml::de::Error) -> Self {
        GatewayError::Configuration(format!("TOML parse error: {err}"))
    }
}
