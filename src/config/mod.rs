//! Configuration management for the gateway.
//!
//! TOML files with:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `HL7_GATEWAY_<SECTION>_<KEY>` overrides
//! - Default values for every setting
//! - Range validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use hl7_gateway::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("hl7-gateway.toml")?;
//! println!("Max attempts: {}", config.transmission.max_retry_attempts);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [conversion]
//! sending_application = "LIS"
//! default_sending_facility = "MAIN_LAB"
//! observation_grouping = "single_order"
//!
//! [transmission]
//! default_timeout_seconds = 30
//! max_retry_attempts = 3
//! retry_delay_seconds = 5
//! enabled_protocols = ["https", "mllp"]
//!
//! [transmission.http]
//! bearer_token = "${HL7_RECEIVER_TOKEN}"
//!
//! [audit]
//! backend = "file"
//! path = "/var/lib/hl7-gateway/audit.jsonl"
//! retention_days = 90
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_from_str, load_or_default};
pub use schema::{
    ApplicationConfig, AuditBackend, AuditConfig, ConversionConfig, GatewayConfig, HttpConfig,
    LoggingConfig, TransmissionConfig,
};
pub use secret::{expose_non_empty, secret_string, SecretString, SecretValue};

/// Serialises tests that read or write process-wide environment variables
#[cfg(test)]
pub(crate) fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
    ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
}
