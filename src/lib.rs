// HL7 Gateway - JSON to HL7 v2 Gateway
// Copyright (c) 2025 HL7 Gateway Contributors
// Licensed under the MIT License

//! # HL7 Gateway - JSON to HL7 v2 Gateway
//!
//! Converts JSON lab result documents into HL7 v2.x ORU^R01 messages and
//! delivers them to receiving systems with retries, timeouts and an audit
//! trail.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Validating** JSON input and reporting every violation at once
//! - **Mapping** patients and observations to MSH, PID, OBR and OBX segments
//! - **Encoding and parsing** ER7 wire text, including escape sequences
//! - **Transmitting** over HTTP, HTTPS, MLLP or a file drop
//! - **Auditing** one log entry per transmission for history and statistics
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Validation, conversion, transmission orchestration
//! - [`hl7`] - Message model, delimiters, codec, mapper and acknowledgments
//! - [`adapters`] - Transmission providers and audit repositories
//! - [`domain`] - Input, transmission and error types
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust
//! use hl7_gateway::core::Converter;
//! use hl7_gateway::domain::{JsonInput, Observation, Patient};
//!
//! let input = JsonInput::new(
//!     Patient::new("P12345", "John", "Doe"),
//!     vec![Observation::new("GLU", "Glucose", "95").with_units("mg/dL")],
//! );
//!
//! let result = Converter::default().convert(&input);
//! assert!(result.success);
//! assert!(result.hl7.unwrap().starts_with("MSH|^~\\&|"));
//! ```
//!
//! ## Transmission
//!
//! ```rust,no_run
//! use hl7_gateway::config::GatewayConfig;
//! use hl7_gateway::core::Gateway;
//! use hl7_gateway::domain::TransmissionProtocol;
//!
//! # async fn example(wire: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let gateway = Gateway::from_config(GatewayConfig::default(), shutdown_rx).await?;
//!
//! let result = gateway
//!     .send_message("mllp://10.0.0.5:2575", wire, TransmissionProtocol::Mllp)
//!     .await;
//! println!("success={} attempts={}", result.success, result.attempts);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Fallible library calls return [`domain::Result`], whose error type is
//! [`domain::GatewayError`]. Conversion and transmission report their
//! outcome as values ([`core::ConversionResult`],
//! [`domain::TransmissionResult`]) rather than errors.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod hl7;
pub mod logging;
