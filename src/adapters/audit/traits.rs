//! Audit repository abstraction
//!
//! Persists one [`TransmissionLog`] per orchestrated request and serves
//! history and statistics queries for reporting callers.

use crate::domain::{Result, TransmissionId, TransmissionLog, TransmissionProtocol};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Audit log storage
///
/// Writes are append-only per transmission id. Reads must not block writes
/// for longer than a single record copy.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persist a log entry
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be stored.
    async fn save(&self, log: &TransmissionLog) -> Result<()>;

    /// Look up a log by transmission id
    async fn get(&self, transmission_id: &TransmissionId) -> Result<Option<TransmissionLog>>;

    /// Most recent logs matching `filter`, newest first, at most `limit`
    async fn query_history(
        &self,
        filter: &HistoryFilter,
        limit: usize,
    ) -> Result<Vec<TransmissionLog>>;

    /// Aggregate counts over a period
    async fn get_statistics(&self, period: &StatisticsPeriod) -> Result<TransmissionStatistics>;

    /// Remove logs completed more than `retention_days` ago
    ///
    /// # Returns
    ///
    /// Number of entries removed.
    async fn delete_older_than(&self, retention_days: u32) -> Result<usize>;
}

/// History query filter; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    pub protocol: Option<TransmissionProtocol>,
    pub success: Option<bool>,
    /// Case-insensitive substring of the endpoint
    pub endpoint: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl HistoryFilter {
    pub fn matches(&self, log: &TransmissionLog) -> bool {
        if self.protocol.is_some_and(|p| p != log.protocol) {
            return false;
        }
        if self.success.is_some_and(|s| s != log.success) {
            return false;
        }
        if let Some(endpoint) = &self.endpoint {
            if !log
                .endpoint
                .to_lowercase()
                .contains(&endpoint.to_lowercase())
            {
                return false;
            }
        }
        if self.from.is_some_and(|from| log.requested_at < from) {
            return false;
        }
        if self.to.is_some_and(|to| log.requested_at > to) {
            return false;
        }
        true
    }
}

/// Time window for statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatisticsPeriod {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl StatisticsPeriod {
    /// Every log ever recorded
    pub fn all() -> Self {
        Self::default()
    }

    /// The trailing window ending now
    ///
    /// A window reaching past the earliest representable instant covers
    /// every log.
    pub fn last(window: Duration) -> Self {
        Self {
            from: Utc::now().checked_sub_signed(window),
            to: None,
        }
    }

    pub fn last_hours(hours: i64) -> Self {
        Duration::try_hours(hours).map_or_else(Self::all, Self::last)
    }

    pub fn last_days(days: i64) -> Self {
        Duration::try_days(days).map_or_else(Self::all, Self::last)
    }

    pub fn contains(&self, log: &TransmissionLog) -> bool {
        self.from.map_or(true, |from| log.requested_at >= from)
            && self.to.map_or(true, |to| log.requested_at <= to)
    }
}

/// Aggregated transmission counts
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransmissionStatistics {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Percentage of successful transmissions, 0.0 when empty
    pub success_rate: f64,
    pub average_response_ms: f64,
    pub by_protocol: BTreeMap<TransmissionProtocol, usize>,
}

impl TransmissionStatistics {
    /// Aggregates an iterator of logs
    pub fn from_logs<'a>(logs: impl IntoIterator<Item = &'a TransmissionLog>) -> Self {
        let mut stats = Self::default();
        let mut total_response_ms: u128 = 0;

        for log in logs {
            stats.total += 1;
            if log.success {
                stats.successful += 1;
            } else {
                stats.failed += 1;
            }
            total_response_ms += u128::from(log.response_time_ms);
            *stats.by_protocol.entry(log.protocol).or_insert(0) += 1;
        }

        if stats.total > 0 {
            stats.success_rate = stats.successful as f64 * 100.0 / stats.total as f64;
            stats.average_response_ms = total_response_ms as f64 / stats.total as f64;
        }
        stats
    }
}

/// Cut-off instant for a retention window
///
/// Clamps to [`DateTime::MIN_UTC`] when the window is longer than the
/// calendar allows, so nothing is older than the cut-off.
pub fn retention_cutoff(retention_days: u32) -> DateTime<Utc> {
    Duration::try_days(i64::from(retention_days))
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
