//! Domain models and types for the gateway.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Input model** ([`JsonInput`], [`Patient`], [`Observation`], [`MessageInfo`])
//! - **Transmission model** ([`TransmissionRequest`], [`TransmissionResult`],
//!   [`TransmissionLog`], [`TransmissionProtocol`])
//! - **Strongly-typed identifiers** ([`TransmissionId`], [`MessageControlId`])
//! - **Error types** ([`GatewayError`], [`MappingError`], [`TransmissionError`])
//! - **Result type alias** ([`Result`])
//!
//! # Example
//!
//! ```rust
//! use hl7_gateway::domain::{JsonInput, Observation, Patient};
//!
//! let input = JsonInput::new(
//!     Patient::new("P12345", "John", "Doe").with_gender("M"),
//!     vec![Observation::new("GLU", "Glucose", "95").with_units("mg/dL")],
//! );
//! assert_eq!(input.observations().len(), 1);
//! ```

pub mod errors;
pub mod ids;
pub mod input;
pub mod result;
pub mod transmission;

// Re-export commonly used types for convenience
pub use errors::{GatewayError, MappingError, TransmissionError};
pub use ids::{MessageControlId, TransmissionId};
pub use input::{Address, JsonInput, MessageInfo, Observation, Patient};
pub use result::Result;
pub use transmission::{
    FailureKind, TransmissionLog, TransmissionProtocol, TransmissionRequest, TransmissionResult,
};
