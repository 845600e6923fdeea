//! Core business logic for the gateway.
//!
//! # Modules
//!
//! - [`validation`] - Input validation collecting every violation
//! - [`converter`] - Validation, mapping and encoding as one operation
//! - [`transmission`] - Retry, timeout and concurrency policy around providers
//! - [`gateway`] - Facade wiring everything from configuration
//!
//! # Workflow
//!
//! 1. **Validate**: check the JSON input, fail fast with all errors
//! 2. **Map**: build MSH, PID, OBR and OBX segments
//! 3. **Encode**: render ER7 wire text
//! 4. **Transmit**: deliver through the protocol's provider with retries
//! 5. **Audit**: write one log per request
//!
//! # Example
//!
//! ```rust,no_run
//! use hl7_gateway::config::load_config;
//! use hl7_gateway::core::Gateway;
//! use hl7_gateway::domain::{JsonInput, TransmissionProtocol};
//!
//! # async fn example(input: JsonInput) -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("hl7-gateway.toml")?;
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let gateway = Gateway::from_config(config, shutdown_rx).await?;
//!
//! let report = gateway
//!     .convert_and_send(&input, "mllp://10.0.0.5:2575", TransmissionProtocol::Mllp)
//!     .await;
//! println!("Delivered: {}", report.is_success());
//! # Ok(())
//! # }
//! ```

pub mod converter;
pub mod gateway;
pub mod transmission;
pub mod validation;

pub use converter::{ConversionResult, Converter};
pub use gateway::{DeliveryReport, Gateway};
pub use transmission::{RetryPolicy, TransmissionOrchestrator, TransmissionState};
pub use validation::{InputValidator, ValidationResult};
