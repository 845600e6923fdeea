//! Parse command implementation
//!
//! Reads ER7 wire text and prints the recovered input model as JSON.

use super::{load_command_config, read_input};
use crate::cli::{EXIT_CONFIG, EXIT_FAILURE, EXIT_OK};
use crate::core::Converter;
use clap::Args;

/// Arguments for the parse command
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// HL7 v2 message file (`-` for stdin)
    pub input: String,

    /// Print only the input model, without preserved segments
    #[arg(long)]
    pub input_only: bool,
}

impl ParseArgs {
    /// Execute the parse command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let Some(config) = load_command_config(config_path) else {
            return Ok(EXIT_CONFIG);
        };

        let raw = read_input(&self.input).await?;
        // files edited on other platforms usually carry LF or CRLF separators
        let wire = raw.trim_end().replace("\r\n", "\r").replace('\n', "\r");

        let converter = Converter::from_config(&config.conversion);
        match converter.parse(&wire) {
            Ok(decoded) => {
                tracing::debug!(
                    message_type = %decoded.message_type,
                    preserved = decoded.preserved_segments.len(),
                    "Parsed message"
                );
                let rendered = if self.input_only {
                    serde_json::to_string_pretty(&decoded.input)?
                } else {
                    serde_json::to_string_pretty(&decoded)?
                };
                println!("{rendered}");
                Ok(EXIT_OK)
            }
            Err(e) => {
                eprintln!("❌ Failed to parse message");
                eprintln!("   Error: {e}");
                Ok(EXIT_FAILURE)
            }
        }
    }
}
