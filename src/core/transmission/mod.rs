//! Transmission orchestration: retry policy and the attempt state machine

pub mod orchestrator;
pub mod policy;

pub use orchestrator::{TransmissionOrchestrator, TransmissionState};
pub use policy::RetryPolicy;
