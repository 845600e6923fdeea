//! Purge command implementation
//!
//! Applies the audit retention window.

use super::{load_command_config, open_audit_repository};
use crate::cli::{EXIT_CONFIG, EXIT_FAILURE, EXIT_OK};
use clap::Args;

/// Arguments for the purge command
#[derive(Args, Debug)]
pub struct PurgeArgs {
    /// Retention window in days (defaults to audit.retention_days)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=3650))]
    pub retention_days: Option<u32>,
}

impl PurgeArgs {
    /// Execute the purge command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let Some(config) = load_command_config(config_path) else {
            return Ok(EXIT_CONFIG);
        };
        let Some(audit) = open_audit_repository(&config).await else {
            return Ok(EXIT_CONFIG);
        };

        let retention_days = self.retention_days.unwrap_or(config.audit.retention_days);
        tracing::info!(retention_days, "Purging audit logs");

        match audit.delete_older_than(retention_days).await {
            Ok(removed) => {
                println!(
                    "✅ Removed {removed} audit log(s) older than {retention_days} day(s)"
                );
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to purge audit log");
                println!("   Error: {e}");
                Ok(EXIT_FAILURE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::audit::{sample_log, AuditRepository, FileAuditRepository};
    use crate::domain::TransmissionProtocol;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_purge_removes_expired_entries() {
        let _guard = crate::config::env_lock();
        let dir = TempDir::new().unwrap();
        let audit_path = dir.path().join("audit.jsonl");
        let config_path = dir.path().join("gateway.toml");
        std::fs::write(
            &config_path,
            format!(
                "[audit]\nbackend = \"file\"\npath = \"{}\"\nretention_days = 30\n",
                audit_path.display()
            ),
        )
        .unwrap();

        let repository = FileAuditRepository::open(&audit_path).await.unwrap();
        let mut old = sample_log(TransmissionProtocol::Http, "http://old", true, 5);
        old.completed_at = Utc::now() - Duration::days(45);
        repository.save(&old).await.unwrap();
        repository
            .save(&sample_log(TransmissionProtocol::Http, "http://new", true, 5))
            .await
            .unwrap();

        let code = PurgeArgs {
            retention_days: None,
        }
        .execute(config_path.to_str().unwrap())
        .await
        .unwrap();
        assert_eq!(code, EXIT_OK);

        let reopened = FileAuditRepository::open(&audit_path).await.unwrap();
        let remaining = reopened
            .query_history(&Default::default(), 10)
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].endpoint, "http://new");
    }
}
