//! Transmission provider abstraction
//!
//! One implementation per wire protocol. Providers never return raw
//! transport errors: every outcome of `send` is a [`TransmissionResult`].

use crate::domain::{
    TransmissionError, TransmissionId, TransmissionProtocol, TransmissionRequest,
    TransmissionResult,
};
use async_trait::async_trait;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;

/// Delivery capability for one protocol
///
/// Implementations must not mutate the request and must be safe to share
/// between concurrent transmissions.
#[async_trait]
pub trait TransmissionProvider: Send + Sync {
    /// Protocol this provider serves
    fn protocol(&self) -> TransmissionProtocol;

    /// Human-readable provider name
    fn name(&self) -> &'static str;

    /// Delivers the request's message to its endpoint
    ///
    /// Measures wall-clock time and translates transport failures into a
    /// failed result.
    async fn send(&self, request: &TransmissionRequest) -> TransmissionResult;

    /// Checks that an endpoint is well-formed for this protocol
    async fn validate_endpoint(&self, endpoint: &str) -> bool;

    /// Lightweight reachability check that sends no payload
    async fn test_connection(&self, endpoint: &str) -> bool;
}

/// Shared provider handle
pub type SharedProvider = Arc<dyn TransmissionProvider + Send + Sync>;

/// Why a delivery failed, with any acknowledgment the receiver sent back
#[derive(Debug)]
pub struct DeliveryFailure {
    pub error: TransmissionError,
    pub acknowledgment: Option<String>,
}

impl DeliveryFailure {
    /// A rejection carrying the receiver's NACK payload
    pub fn rejected(reason: impl Into<String>, acknowledgment: impl Into<String>) -> Self {
        Self {
            error: TransmissionError::Rejected(reason.into()),
            acknowledgment: Some(acknowledgment.into()),
        }
    }
}

impl From<TransmissionError> for DeliveryFailure {
    fn from(error: TransmissionError) -> Self {
        Self {
            error,
            acknowledgment: None,
        }
    }
}

/// Runs a delivery and turns its outcome into a timed [`TransmissionResult`]
pub async fn measure<F>(delivery: F) -> TransmissionResult
where
    F: Future<Output = Result<Option<String>, DeliveryFailure>>,
{
    let sent_at = Utc::now();
    let started = Instant::now();
    let outcome = delivery.await;
    let elapsed = started.elapsed();
    let transmission_id = TransmissionId::generate();

    match outcome {
        Ok(acknowledgment) => {
            TransmissionResult::success(transmission_id, acknowledgment, elapsed, sent_at)
        }
        Err(failure) => {
            let result = TransmissionResult::failure(
                transmission_id,
                failure.error.failure_kind(),
                failure.error.to_string(),
                elapsed,
                sent_at,
            );
            match failure.acknowledgment {
                Some(ack) => result.with_acknowledgment(ack),
                None => result,
            }
        }
    }
}
