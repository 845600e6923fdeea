//! Stats command implementation

use super::{load_command_config, open_audit_repository};
use crate::adapters::audit::StatisticsPeriod;
use crate::cli::{EXIT_CONFIG, EXIT_FAILURE, EXIT_OK};
use clap::Args;

/// Arguments for the stats command
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Only the last N hours
    #[arg(long, conflicts_with = "days", value_parser = clap::value_parser!(i64).range(1..))]
    pub hours: Option<i64>,

    /// Only the last N days
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
    pub days: Option<i64>,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsArgs {
    fn period(&self) -> StatisticsPeriod {
        match (self.hours, self.days) {
            (Some(hours), _) => StatisticsPeriod::last_hours(hours),
            (_, Some(days)) => StatisticsPeriod::last_days(days),
            _ => StatisticsPeriod::all(),
        }
    }

    fn period_label(&self) -> String {
        match (self.hours, self.days) {
            (Some(hours), _) => format!("last {hours} hour(s)"),
            (_, Some(days)) => format!("last {days} day(s)"),
            _ => "all time".to_string(),
        }
    }

    /// Execute the stats command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let Some(config) = load_command_config(config_path) else {
            return Ok(EXIT_CONFIG);
        };
        let Some(audit) = open_audit_repository(&config).await else {
            return Ok(EXIT_CONFIG);
        };

        let stats = match audit.get_statistics(&self.period()).await {
            Ok(stats) => stats,
            Err(e) => {
                println!("❌ Failed to read audit log");
                println!("   Error: {e}");
                return Ok(EXIT_FAILURE);
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(EXIT_OK);
        }

        println!("📊 Transmission Statistics ({})", self.period_label());
        println!();
        println!("  Total: {}", stats.total);
        println!("  Successful: {}", stats.successful);
        println!("  Failed: {}", stats.failed);
        println!("  Success Rate: {:.1}%", stats.success_rate);
        println!("  Average Response: {:.0}ms", stats.average_response_ms);
        if !stats.by_protocol.is_empty() {
            println!("  By Protocol:");
            for (protocol, count) in &stats.by_protocol {
                println!("    {protocol}: {count}");
            }
        }
        Ok(EXIT_OK)
    }
}
