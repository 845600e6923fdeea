//! CLI command implementations

pub mod convert;
pub mod history;
pub mod init;
pub mod parse;
pub mod protocols;
pub mod purge;
pub mod send;
pub mod stats;
pub mod test_connection;
pub mod validate;
pub mod validate_config;

use super::DEFAULT_CONFIG_PATH;
use crate::adapters::audit::{create_audit_repository, SharedAuditRepository};
use crate::config::{load_config, load_or_default, AuditBackend, GatewayConfig};
use anyhow::Context;
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Loads the configuration for a command, printing the problem on failure
///
/// A missing file at the default location falls back to built-in defaults
/// plus environment overrides.
pub(crate) fn load_command_config(config_path: &str) -> Option<GatewayConfig> {
    let path = Path::new(config_path);
    let loaded = if config_path == DEFAULT_CONFIG_PATH && !path.exists() {
        tracing::debug!("No configuration file found, using defaults");
        load_or_default(None)
    } else {
        load_config(path)
    };

    match loaded {
        Ok(config) => Some(config),
        Err(e) => {
            println!("❌ Failed to load configuration file: {config_path}");
            println!("   Error: {e}");
            None
        }
    }
}

/// Opens the configured audit repository for the audit commands
///
/// Prints the problem and returns `None` when auditing is disabled or the
/// backend cannot be opened.
pub(crate) async fn open_audit_repository(
    config: &GatewayConfig,
) -> Option<SharedAuditRepository> {
    match create_audit_repository(&config.audit).await {
        Ok(Some(repository)) => {
            if config.audit.backend == AuditBackend::Memory {
                println!("⚠️  The memory audit backend keeps nothing between runs");
                println!("   Set audit.backend = \"file\" to query past transmissions");
            }
            Some(repository)
        }
        Ok(None) => {
            println!("❌ Audit logging is disabled (audit.enabled = false)");
            None
        }
        Err(e) => {
            println!("❌ Failed to open audit log");
            println!("   Error: {e}");
            None
        }
    }
}

/// Reads a command input file, `-` meaning stdin
pub(crate) async fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut buffer = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buffer)
            .await
            .context("Failed to read stdin")?;
        Ok(buffer)
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {path}"))
    }
}

/// ER7 text with segments on separate lines, for terminal display
pub(crate) fn display_er7(wire: &str) -> String {
    wire.split('\r').collect::<Vec<_>>().join("\n")
}
