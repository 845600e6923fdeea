//! Validate command implementation
//!
//! Checks a JSON input document against the conversion rules and reports
//! every violation found.

use super::{load_command_config, read_input};
use crate::cli::{EXIT_CONFIG, EXIT_FAILURE, EXIT_OK};
use crate::core::Converter;
use crate::domain::JsonInput;
use clap::Args;

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// JSON input file (`-` for stdin)
    pub input: String,
}

impl ValidateArgs {
    /// Execute the validate command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let Some(config) = load_command_config(config_path) else {
            return Ok(EXIT_CONFIG);
        };

        tracing::info!(input = %self.input, "Validating input document");
        let json = read_input(&self.input).await?;

        let input: JsonInput = match serde_json::from_str(&json) {
            Ok(input) => input,
            Err(e) => {
                println!("❌ Input is not valid JSON");
                println!("   Error: {e}");
                return Ok(EXIT_FAILURE);
            }
        };

        let result = Converter::from_config(&config.conversion).validate(&input);
        if result.is_valid() {
            println!("✅ Input is valid");
            return Ok(EXIT_OK);
        }

        println!("❌ Input failed validation ({} error(s))", result.errors().len());
        for error in result.errors() {
            println!("   - {error}");
        }
        Ok(EXIT_FAILURE)
    }
}
