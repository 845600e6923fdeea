//! JSON-lines audit repository
//!
//! One JSON object per line, appended on save. Queries read the file; the
//! retention purge rewrites it through a temporary file and a rename.

use super::traits::{
    retention_cutoff, AuditRepository, HistoryFilter, StatisticsPeriod, TransmissionStatistics,
};
use crate::domain::{GatewayError, Result, TransmissionId, TransmissionLog};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

pub struct FileAuditRepository {
    path: PathBuf,
    /// Recorded ids; the lock also serialises writers
    ids: Mutex<HashSet<TransmissionId>>,
}

impl FileAuditRepository {
    /// Opens (or prepares) the log file at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or an
    /// existing file cannot be read.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                GatewayError::Audit(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        let existing = read_logs(&path).await?;
        let ids = existing.into_iter().map(|log| log.transmission_id).collect();
        tracing::debug!(path = %path.display(), "Opened audit log file");

        Ok(Self {
            path,
            ids: Mutex::new(ids),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, line: &str) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error("open", e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| self.io_error("write", e))?;
        file.flush().await.map_err(|e| self.io_error("flush", e))
    }

    fn io_error(&self, action: &str, e: std::io::Error) -> GatewayError {
        GatewayError::Audit(format!("Failed to {action} {}: {e}", self.path.display()))
    }
}

/// Reads every parseable log line; a missing file is an empty log
async fn read_logs(path: &Path) -> Result<Vec<TransmissionLog>> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(GatewayError::Audit(format!(
                "Failed to read {}: {e}",
                path.display()
            )))
        }
    };

    let mut logs = Vec::new();
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<TransmissionLog>(line) {
            Ok(log) => logs.push(log),
            Err(e) => tracing::warn!(
                path = %path.display(),
                line = index + 1,
                error = %e,
                "Skipping unreadable audit log line"
            ),
        }
    }
    Ok(logs)
}

#[async_trait]
impl AuditRepository for FileAuditRepository {
    async fn save(&self, log: &TransmissionLog) -> Result<()> {
        let mut ids = self.ids.lock().await;
        if ids.contains(&log.transmission_id) {
            return Err(GatewayError::Audit(format!(
                "Transmission {} is already recorded",
                log.transmission_id
            )));
        }

        let mut line = serde_json::to_string(log)?;
        line.push('\n');
        self.append(&line).await?;
        ids.insert(log.transmission_id.clone());
        Ok(())
    }

    async fn get(&self, transmission_id: &TransmissionId) -> Result<Option<TransmissionLog>> {
        Ok(read_logs(&self.path)
            .await?
            .into_iter()
            .find(|log| &log.transmission_id == transmission_id))
    }

    async fn query_history(
        &self,
        filter: &HistoryFilter,
        limit: usize,
    ) -> Result<Vec<TransmissionLog>> {
        Ok(read_logs(&self.path)
            .await?
            .into_iter()
            .rev()
            .filter(|log| filter.matches(log))
            .take(limit)
            .collect())
    }

    async fn get_statistics(&self, period: &StatisticsPeriod) -> Result<TransmissionStatistics> {
        let logs = read_logs(&self.path).await?;
        Ok(TransmissionStatistics::from_logs(
            logs.iter().filter(|log| period.contains(log)),
        ))
    }

    async fn delete_older_than(&self, retention_days: u32) -> Result<usize> {
        let cutoff = retention_cutoff(retention_days);
        let mut ids = self.ids.lock().await;

        let logs = read_logs(&self.path).await?;
        let before = logs.len();
        let kept: Vec<_> = logs
            .into_iter()
            .filter(|log| log.completed_at >= cutoff)
            .collect();
        let removed = before - kept.len();
        if removed == 0 {
            return Ok(0);
        }

        let mut content = String::new();
        for log in &kept {
            content.push_str(&serde_json::to_string(log)?);
            content.push('\n');
        }

        let temp = self.path.with_extension("jsonl.tmp");
        fs::write(&temp, content)
            .await
            .map_err(|e| self.io_error("write", e))?;
        fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.io_error("replace", e))?;

        *ids = kept.into_iter().map(|log| log.transmission_id).collect();
        tracing::info!(removed, retention_days, "Purged audit logs");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::audit::sample_log;
    use crate::domain::TransmissionProtocol;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_appends_json_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit").join("log.jsonl");
        let repo = FileAuditRepository::open(&path).await.unwrap();

        let a = sample_log(TransmissionProtocol::Http, "http://a", true, 1);
        let b = sample_log(TransmissionProtocol::Mllp, "b:1", false, 2);
        repo.save(&a).await.unwrap();
        repo.save(&b).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert_eq!(repo.get(&b.transmission_id).await.unwrap(), Some(b));
    }

    #[tokio::test]
    async fn test_reopen_keeps_history_and_rejects_duplicates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.jsonl");
        let log = sample_log(TransmissionProtocol::File, "/out", true, 1);

        FileAuditRepository::open(&path)
            .await
            .unwrap()
            .save(&log)
            .await
            .unwrap();

        let reopened = FileAuditRepository::open(&path).await.unwrap();
        assert!(reopened.save(&log).await.is_err());
        let history = reopened
            .query_history(&HistoryFilter::default(), 10)
            .await
            .unwrap();
        assert_eq!(history, vec![log]);
    }

    #[tokio::test]
    async fn test_skips_corrupt_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.jsonl");
        let log = sample_log(TransmissionProtocol::Http, "http://a", true, 1);
        let line = serde_json::to_string(&log).unwrap();
        std::fs::write(&path, format!("{line}\n{{not json\n")).unwrap();

        let repo = FileAuditRepository::open(&path).await.unwrap();
        let stats = repo.get_statistics(&StatisticsPeriod::all()).await.unwrap();
        assert_eq!(stats.total, 1);
    }

    #[tokio::test]
    async fn test_delete_older_than_rewrites_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.jsonl");
        let repo = FileAuditRepository::open(&path).await.unwrap();

        let mut old = sample_log(TransmissionProtocol::Http, "http://a", true, 1);
        old.completed_at = Utc::now() - Duration::days(30);
        let recent = sample_log(TransmissionProtocol::Http, "http://a", true, 1);
        repo.save(&old).await.unwrap();
        repo.save(&recent).await.unwrap();

        assert_eq!(repo.delete_older_than(7).await.unwrap(), 1);
        assert_eq!(repo.delete_older_than(7).await.unwrap(), 0);
        assert!(repo.get(&old.transmission_id).await.unwrap().is_none());
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 1);

        // a purged id may be recorded again
        repo.save(&old).await.unwrap();
    }
}
