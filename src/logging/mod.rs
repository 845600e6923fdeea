//! Logging and observability
//!
//! Structured logging through `tracing`:
//! - Console output filtered by level or `RUST_LOG`
//! - Optional JSON log files with rotation
//! - Macros for the transmission lifecycle
//!
//! Message content is never logged. Transmissions are identified by request
//! id, endpoint, size and digest.
//!
//! # Example
//!
//! ```no_run
//! use hl7_gateway::logging::init_logging;
//! use hl7_gateway::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Gateway started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of an orchestrated transmission
///
/// # Example
///
/// ```no_run
/// use hl7_gateway::log_transmission_start;
/// use hl7_gateway::domain::{TransmissionProtocol, TransmissionRequest};
///
/// let request = TransmissionRequest::new("mllp://10.0.0.5:2575", "MSH|^~\\&|A", TransmissionProtocol::Mllp);
/// log_transmission_start!(&request);
/// ```
#[macro_export]
macro_rules! log_transmission_start {
    ($request:expr) => {
        tracing::info!(
            request_id = %$request.request_id(),
            endpoint = %$request.endpoint(),
            protocol = %$request.protocol(),
            message_size = $request.message_size(),
            "Starting transmission"
        );
    };
}

/// Log the final outcome of a transmission
#[macro_export]
macro_rules! log_transmission_complete {
    ($request:expr, $result:expr) => {
        if $result.success {
            tracing::info!(
                request_id = %$request.request_id(),
                transmission_id = %$result.transmission_id,
                attempts = $result.attempts,
                response_ms = ($result.response_time.as_millis() as u64),
                "Transmission succeeded"
            );
        } else {
            tracing::warn!(
                request_id = %$request.request_id(),
                transmission_id = %$result.transmission_id,
                attempts = $result.attempts,
                failure_kind = ?$result.failure_kind,
                error = $result.error_message.as_deref().unwrap_or_default(),
                "Transmission failed"
            );
        }
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use hl7_gateway::log_error_with_context;
/// use hl7_gateway::domain::GatewayError;
///
/// let error = GatewayError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use hl7_gateway::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, "Transport failure: connection refused");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = $reason,
            "Retrying transmission"
        );
    };
}
