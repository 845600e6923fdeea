//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use crate::cli::{DEFAULT_CONFIG_PATH, EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub output: String,

    /// Include every section with its defaults and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing HL7 Gateway configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your facility settings", self.output);
                println!("  2. Put HTTP credentials in a .env file if needed:");
                println!("     - HL7_GATEWAY_TRANSMISSION_HTTP_USERNAME / _PASSWORD");
                println!("     - or HL7_GATEWAY_TRANSMISSION_HTTP_BEARER_TOKEN");
                println!(
                    "  3. Validate configuration: hl7-gateway -c {} validate-config",
                    self.output
                );
                println!("  4. Check a receiver: hl7-gateway test-connection -e <endpoint> -p mllp");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# HL7 Gateway Configuration File
# JSON lab results to HL7 v2 ORU^R01, delivered over HTTP(S), MLLP or file drop

[application]
log_level = "info"

[conversion]
sending_application = "HL7GW"
default_sending_facility = "LAB"
processing_id = "P"

[transmission]
default_timeout_seconds = 30
max_retry_attempts = 3
retry_delay_seconds = 5
enabled_protocols = ["http", "https", "mllp", "file"]

[audit]
enabled = true
backend = "file"
path = "./audit/transmissions.jsonl"
retention_days = 90
"#
        .to_string()
    }

    /// Generate configuration with every option documented
    fn generate_config_with_examples() -> String {
        r#"# HL7 Gateway Configuration File
# JSON lab results to HL7 v2 ORU^R01, delivered over HTTP(S), MLLP or file drop
#
# Any value can reference an environment variable with ${VAR_NAME}.
# HL7_GATEWAY_<SECTION>_<KEY> variables override values in this file,
# e.g. HL7_GATEWAY_TRANSMISSION_MAX_RETRY_ATTEMPTS=5

[application]
# trace | debug | info | warn | error
log_level = "info"

[conversion]
# MSH-3 / MSH-5 when the input's messageInfo does not set them
sending_application = "HL7GW"
receiving_application = ""

# MSH-4 / MSH-6 fallbacks
default_sending_facility = "LAB"
default_receiving_facility = ""

# MSH-11: P (production), T (training), D (debugging)
processing_id = "P"

# MSH-12
version = "2.5"

# Accept inputs whose observation list is empty
allow_empty_observations = true

# single_order: one OBR for all observations
# order_per_observation: one OBR before each OBX
observation_grouping = "single_order"
panel_code = "LAB"
panel_description = "Laboratory Results"

[transmission]
# Per-attempt timeout (1-300)
default_timeout_seconds = 30

# Total attempts per message, first attempt included (1-10)
max_retry_attempts = 3

# Fixed wait between attempts (0-300)
retry_delay_seconds = 5

# Retry attempts that timed out
retry_on_timeout = true

# Largest accepted message in bytes (1024 - 16777216)
max_message_size_bytes = 1048576

# In-flight transmissions across the process (1-256)
max_concurrent_transmissions = 10

# http | https | mllp | file
enabled_protocols = ["http", "https", "mllp", "file"]

[transmission.http]
tls_verify = true
content_type = "application/hl7-v2"
# Basic authentication
# username = "${HL7_GATEWAY_HTTP_USER}"
# password = "${HL7_GATEWAY_HTTP_PASSWORD}"
# or a bearer token
# bearer_token = "${HL7_GATEWAY_HTTP_TOKEN}"

[audit]
enabled = true
# memory (lost on exit) | file (JSON lines)
backend = "file"
path = "./audit/transmissions.jsonl"
# Entries older than this are removed by `hl7-gateway purge` (1-3650)
retention_days = 90

[logging]
# JSON log file in addition to console output
local_enabled = false
local_path = "./logs"
# daily | hourly | never
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config_from_str, AuditBackend};
    use tempfile::TempDir;

    #[test]
    fn test_generated_configs_are_valid() {
        let _guard = crate::config::env_lock();

        let minimal = load_config_from_str(&InitArgs::generate_minimal_config()).unwrap();
        assert_eq!(minimal.audit.backend, AuditBackend::File);
        assert_eq!(minimal.conversion.default_sending_facility, "LAB");

        let full = load_config_from_str(&InitArgs::generate_config_with_examples()).unwrap();
        assert_eq!(full.transmission.max_retry_attempts, 3);
        assert!(full.transmission.http.username.is_none());
        assert!(!full.logging.local_enabled);
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("gateway.toml");
        std::fs::write(&output, "# existing").unwrap();

        let args = InitArgs {
            output: output.display().to_string(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), EXIT_CONFIG);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "# existing");

        let args = InitArgs { force: true, ..args };
        assert_eq!(args.execute().await.unwrap(), EXIT_OK);
        assert!(std::fs::read_to_string(&output)
            .unwrap()
            .contains("[transmission]"));
    }
}
