//! CLI interface and argument parsing
//!
//! Exit codes: 0 success, 1 validation or transmission failure,
//! 2 configuration error, 5 fatal error.

pub mod commands;

use clap::{Parser, Subcommand};

/// Exit code for success
pub const EXIT_OK: i32 = 0;
/// Exit code for a rejected input or failed transmission
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for configuration problems
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for unexpected errors
pub const EXIT_FATAL: i32 = 5;

/// HL7 Gateway - JSON to HL7 v2 conversion and delivery
#[derive(Parser, Debug)]
#[command(name = "hl7-gateway")]
#[command(version, about, long_about = None)]
#[command(author = "HL7 Gateway Contributors")]
pub struct Cli {
    /// Path to configuration file (defaults apply when the default file is absent)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, env = "HL7_GATEWAY_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "HL7_GATEWAY_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Configuration file looked up when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "hl7-gateway.toml";

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a JSON input document to HL7 v2
    Convert(commands::convert::ConvertArgs),

    /// Parse an HL7 v2 message back into the JSON model
    Parse(commands::parse::ParseArgs),

    /// Validate a JSON input document without converting it
    Validate(commands::validate::ValidateArgs),

    /// Convert (if needed) and send a message to an endpoint
    Send(commands::send::SendArgs),

    /// Check that an endpoint is reachable
    TestConnection(commands::test_connection::TestConnectionArgs),

    /// List enabled transmission protocols
    Protocols(commands::protocols::ProtocolsArgs),

    /// Show recent transmissions from the audit log
    History(commands::history::HistoryArgs),

    /// Show transmission statistics from the audit log
    Stats(commands::stats::StatsArgs),

    /// Delete audit logs older than the retention window
    Purge(commands::purge::PurgeArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate_config::ValidateConfigArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
