//! History command implementation
//!
//! Lists recent transmissions from the audit log, newest first.

use super::{load_command_config, open_audit_repository};
use crate::adapters::audit::HistoryFilter;
use crate::cli::{EXIT_CONFIG, EXIT_FAILURE, EXIT_OK};
use crate::domain::TransmissionProtocol;
use clap::Args;
use std::str::FromStr;

/// Arguments for the history command
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Maximum number of entries
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: usize,

    /// Only this protocol
    #[arg(short, long, value_parser = TransmissionProtocol::from_str)]
    pub protocol: Option<TransmissionProtocol>,

    /// Only successful transmissions
    #[arg(long, conflicts_with = "failed")]
    pub success: bool,

    /// Only failed transmissions
    #[arg(long)]
    pub failed: bool,

    /// Only endpoints containing this text (case-insensitive)
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Print the entries as JSON
    #[arg(long)]
    pub json: bool,
}

impl HistoryArgs {
    fn filter(&self) -> HistoryFilter {
        let success = match (self.success, self.failed) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        HistoryFilter {
            protocol: self.protocol,
            success,
            endpoint: self.endpoint.clone(),
            ..Default::default()
        }
    }

    /// Execute the history command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let Some(config) = load_command_config(config_path) else {
            return Ok(EXIT_CONFIG);
        };
        let Some(audit) = open_audit_repository(&config).await else {
            return Ok(EXIT_CONFIG);
        };

        let logs = match audit.query_history(&self.filter(), self.limit).await {
            Ok(logs) => logs,
            Err(e) => {
                println!("❌ Failed to read audit log");
                println!("   Error: {e}");
                return Ok(EXIT_FAILURE);
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&logs)?);
            return Ok(EXIT_OK);
        }

        if logs.is_empty() {
            println!("No transmissions recorded");
            return Ok(EXIT_OK);
        }

        println!("📜 Transmission History ({} entries)", logs.len());
        println!();
        for log in &logs {
            let status = if log.success { "✅" } else { "❌" };
            println!(
                "{status} {}  {:<5} {:>6}ms  {} attempt(s)  {}",
                log.completed_at.format("%Y-%m-%d %H:%M:%S"),
                log.protocol,
                log.response_time_ms,
                log.attempts,
                log.endpoint
            );
            if let Some(error) = &log.error_message {
                println!("     {error}");
            }
        }
        Ok(EXIT_OK)
    }
}
