//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the gateway configuration file.

use crate::cli::{EXIT_CONFIG, EXIT_OK};
use crate::config::{load_config, AuditBackend};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateConfigArgs {}

impl ValidateConfigArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as part of loading
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let protocols: Vec<&str> = config
            .transmission
            .enabled_protocols
            .iter()
            .map(|p| p.as_str())
            .collect();

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!(
            "  Sending Application: {}",
            config.conversion.sending_application
        );
        println!("  HL7 Version: {}", config.conversion.version);
        println!("  Processing ID: {}", config.conversion.processing_id);
        println!("  Enabled Protocols: {}", protocols.join(", "));
        println!(
            "  Timeout: {}s per attempt",
            config.transmission.default_timeout_seconds
        );
        println!(
            "  Attempts: {} (delay {}s)",
            config.transmission.max_retry_attempts, config.transmission.retry_delay_seconds
        );
        println!(
            "  Max Concurrent: {}",
            config.transmission.max_concurrent_transmissions
        );
        println!(
            "  Max Message Size: {} bytes",
            config.transmission.max_message_size_bytes
        );
        match (config.audit.enabled, config.audit.backend) {
            (false, _) => println!("  Audit: disabled"),
            (true, AuditBackend::Memory) => println!("  Audit: in-memory"),
            (true, AuditBackend::File) => println!("  Audit: file ({})", config.audit.path),
        }
        println!("  Audit Retention: {} days", config.audit.retention_days);
        if config.logging.local_enabled {
            println!(
                "  File Logging: {} ({})",
                config.logging.local_path, config.logging.local_rotation
            );
        }
        println!();

        Ok(EXIT_OK)
    }
}
