//! Transmission domain model
//!
//! Request, result and audit log types shared by the providers, the
//! orchestrator and the audit repositories.

use super::ids::TransmissionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default per-attempt timeout when none is configured
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Wire transport used to deliver a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransmissionProtocol {
    /// Plain HTTP POST
    Http,
    /// HTTP POST over TLS
    Https,
    /// Minimal Lower Layer Protocol over TCP
    Mllp,
    /// File drop into a directory
    File,
}

impl TransmissionProtocol {
    /// All known protocols
    pub const ALL: [TransmissionProtocol; 4] = [
        TransmissionProtocol::Http,
        TransmissionProtocol::Https,
        TransmissionProtocol::Mllp,
        TransmissionProtocol::File,
    ];

    /// Lowercase tag used in configuration and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            TransmissionProtocol::Http => "http",
            TransmissionProtocol::Https => "https",
            TransmissionProtocol::Mllp => "mllp",
            TransmissionProtocol::File => "file",
        }
    }
}

impl fmt::Display for TransmissionProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransmissionProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(TransmissionProtocol::Http),
            "https" => Ok(TransmissionProtocol::Https),
            "mllp" | "tcp" => Ok(TransmissionProtocol::Mllp),
            "file" => Ok(TransmissionProtocol::File),
            other => Err(format!(
                "Unknown protocol '{other}'. Must be one of: http, https, mllp, file"
            )),
        }
    }
}

/// A message ready to be delivered
///
/// The request id and creation time are assigned at construction and cannot
/// be changed afterwards; they correlate the request with its audit log.
#[derive(Debug, Clone, Serialize)]
pub struct TransmissionRequest {
    endpoint: String,
    message: String,
    headers: HashMap<String, String>,
    timeout_seconds: u64,
    protocol: TransmissionProtocol,
    request_id: TransmissionId,
    created_at: DateTime<Utc>,
}

impl TransmissionRequest {
    /// Creates a request with the default timeout and no headers
    pub fn new(
        endpoint: impl Into<String>,
        message: impl Into<String>,
        protocol: TransmissionProtocol,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            message: message.into(),
            headers: HashMap::new(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            protocol,
            request_id: TransmissionId::generate(),
            created_at: Utc::now(),
        }
    }

    /// Adds a header (used by HTTP providers)
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the per-attempt timeout
    pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn protocol(&self) -> TransmissionProtocol {
        self.protocol
    }

    pub fn request_id(&self) -> &TransmissionId {
        &self.request_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Message size in bytes
    pub fn message_size(&self) -> usize {
        self.message.len()
    }

    /// SHA-256 digest of the message, used instead of the payload in logs
    pub fn message_digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.message.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Category of a failed transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Attempt exceeded its timeout
    Timeout,
    /// Network or protocol failure
    Transport,
    /// Caller cancelled the transmission
    Cancelled,
    /// Receiver returned a negative acknowledgment
    Rejected,
    /// No provider registered for the protocol
    UnsupportedProtocol,
    /// Request failed pre-flight checks (endpoint, size)
    InvalidRequest,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Transport => "transport",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Rejected => "rejected",
            FailureKind::UnsupportedProtocol => "unsupported_protocol",
            FailureKind::InvalidRequest => "invalid_request",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a transmission
///
/// `acknowledgment_message` is meaningful on success, `error_message` on
/// failure. A rejected message carries both: the error and the NACK payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmissionResult {
    pub success: bool,
    pub transmission_id: TransmissionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledgment_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    #[serde(with = "duration_millis")]
    pub response_time: Duration,
    pub sent_at: DateTime<Utc>,
    /// Number of provider attempts made (0 if rejected before any attempt)
    pub attempts: u32,
}

impl TransmissionResult {
    /// Creates a successful result
    pub fn success(
        transmission_id: TransmissionId,
        acknowledgment_message: Option<String>,
        response_time: Duration,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            success: true,
            transmission_id,
            error_message: None,
            acknowledgment_message,
            failure_kind: None,
            response_time,
            sent_at,
            attempts: 1,
        }
    }

    /// Creates a failed result
    pub fn failure(
        transmission_id: TransmissionId,
        kind: FailureKind,
        error_message: impl Into<String>,
        response_time: Duration,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            success: false,
            transmission_id,
            error_message: Some(error_message.into()),
            acknowledgment_message: None,
            failure_kind: Some(kind),
            response_time,
            sent_at,
            attempts: 1,
        }
    }

    /// Attaches a protocol-level acknowledgment (or NACK) payload
    pub fn with_acknowledgment(mut self, acknowledgment: impl Into<String>) -> Self {
        self.acknowledgment_message = Some(acknowledgment.into());
        self
    }

    /// Sets the attempt count
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// True if a retry could plausibly succeed
    pub fn is_retryable(&self, retry_on_timeout: bool) -> bool {
        match self.failure_kind {
            Some(FailureKind::Transport) => true,
            Some(FailureKind::Timeout) => retry_on_timeout,
            _ => false,
        }
    }
}

/// Durable audit record of one orchestrated transmission
///
/// Written once per request, summarising the final attempt. Holds a digest
/// of the message rather than the message itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmissionLog {
    pub transmission_id: TransmissionId,
    pub request_id: TransmissionId,
    pub endpoint: String,
    pub protocol: TransmissionProtocol,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledgment_message: Option<String>,
    pub attempts: u32,
    pub response_time_ms: u64,
    pub message_size: usize,
    pub message_sha256: String,
    pub requested_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl TransmissionLog {
    /// Builds the log entry for a request and its final result
    pub fn from_outcome(request: &TransmissionRequest, result: &TransmissionResult) -> Self {
        Self {
            transmission_id: result.transmission_id.clone(),
            request_id: request.request_id().clone(),
            endpoint: request.endpoint().to_string(),
            protocol: request.protocol(),
            success: result.success,
            failure_kind: result.failure_kind,
            error_message: result.error_message.clone(),
            acknowledgment_message: result.acknowledgment_message.clone(),
            attempts: result.attempts,
            response_time_ms: result.response_time.as_millis() as u64,
            message_size: request.message_size(),
            message_sha256: request.message_digest(),
            requested_at: request.created_at(),
            completed_at: Utc::now(),
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
