//! Convert command implementation

use super::{display_er7, load_command_config, read_input};
use crate::cli::{EXIT_CONFIG, EXIT_FAILURE, EXIT_OK};
use crate::core::Converter;
use anyhow::Context;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// Output format for `convert`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Raw ER7 wire text
    Er7,
    /// Full conversion result as JSON
    Json,
}

/// Arguments for the convert command
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// JSON input file (`-` for stdin)
    pub input: String,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Er7)]
    pub format: OutputFormat,
}

impl ConvertArgs {
    /// Execute the convert command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let Some(config) = load_command_config(config_path) else {
            return Ok(EXIT_CONFIG);
        };

        let json = read_input(&self.input).await?;
        let converter = Converter::from_config(&config.conversion);
        let result = converter.convert_json(&json);

        if !result.success {
            eprintln!(
                "❌ Conversion failed: {}",
                result.error_message.as_deref().unwrap_or("unknown error")
            );
            for error in &result.errors {
                eprintln!("   - {error}");
            }
            if self.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            return Ok(EXIT_FAILURE);
        }

        let rendered = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&result)?,
            OutputFormat::Er7 => result.hl7.clone().unwrap_or_default(),
        };

        match &self.output {
            Some(path) => {
                tokio::fs::write(path, rendered)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("✅ Wrote {}", path.display());
            }
            None if self.format == OutputFormat::Er7 => println!("{}", display_er7(&rendered)),
            None => println!("{rendered}"),
        }

        Ok(EXIT_OK)
    }
}
