//! In-memory audit repository
//!
//! Default backend. Logs live for the lifetime of the process.

use super::traits::{
    retention_cutoff, AuditRepository, HistoryFilter, StatisticsPeriod, TransmissionStatistics,
};
use crate::domain::{GatewayError, Result, TransmissionId, TransmissionLog};
use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryAuditRepository {
    logs: RwLock<Vec<TransmissionLog>>,
}

impl InMemoryAuditRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored logs
    pub async fn len(&self) -> usize {
        self.logs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.logs.read().await.is_empty()
    }

    /// Snapshot of every stored log, oldest first
    pub async fn all(&self) -> Vec<TransmissionLog> {
        self.logs.read().await.clone()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn save(&self, log: &TransmissionLog) -> Result<()> {
        let mut logs = self.logs.write().await;
        if logs
            .iter()
            .any(|existing| existing.transmission_id == log.transmission_id)
        {
            return Err(GatewayError::Audit(format!(
                "Transmission {} is already recorded",
                log.transmission_id
            )));
        }
        logs.push(log.clone());
        Ok(())
    }

    async fn get(&self, transmission_id: &TransmissionId) -> Result<Option<TransmissionLog>> {
        let logs = self.logs.read().await;
        Ok(logs
            .iter()
            .find(|log| &log.transmission_id == transmission_id)
            .cloned())
    }

    async fn query_history(
        &self,
        filter: &HistoryFilter,
        limit: usize,
    ) -> Result<Vec<TransmissionLog>> {
        let logs = self.logs.read().await;
        Ok(logs
            .iter()
            .rev()
            .filter(|log| filter.matches(log))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_statistics(&self, period: &StatisticsPeriod) -> Result<TransmissionStatistics> {
        let logs = self.logs.read().await;
        Ok(TransmissionStatistics::from_logs(
            logs.iter().filter(|log| period.contains(log)),
        ))
    }

    async fn delete_older_than(&self, retention_days: u32) -> Result<usize> {
        let cutoff = retention_cutoff(retention_days);
        let mut logs = self.logs.write().await;
        let before = logs.len();
        logs.retain(|log| log.completed_at >= cutoff);
        Ok(before - logs.len())
    }
}
