//! Audit log repositories
//!
//! - [`InMemoryAuditRepository`] keeps logs for the life of the process
//! - [`FileAuditRepository`] appends JSON lines to a file

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileAuditRepository;
pub use memory::InMemoryAuditRepository;
pub use traits::{
    AuditRepository, HistoryFilter, StatisticsPeriod, TransmissionStatistics,
};

use crate::config::{AuditBackend, AuditConfig};
use crate::domain::Result;
use std::sync::Arc;

/// Shared audit repository handle
pub type SharedAuditRepository = Arc<dyn AuditRepository + Send + Sync>;

/// Create the audit repository selected by the configuration
///
/// Returns `None` when auditing is disabled.
///
/// # Errors
///
/// Returns an error if the file backend cannot be opened.
pub async fn create_audit_repository(
    config: &AuditConfig,
) -> Result<Option<SharedAuditRepository>> {
    if !config.enabled {
        tracing::info!("Audit logging is disabled");
        return Ok(None);
    }

    match config.backend {
        AuditBackend::Memory => {
            tracing::info!("Using in-memory audit repository");
            Ok(Some(
                Arc::new(InMemoryAuditRepository::new()) as SharedAuditRepository
            ))
        }
        AuditBackend::File => {
            tracing::info!(path = %config.path, "Using file audit repository");
            let repository = FileAuditRepository::open(&config.path).await?;
            Ok(Some(Arc::new(repository) as SharedAuditRepository))
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_log(
    protocol: crate::domain::TransmissionProtocol,
    endpoint: &str,
    success: bool,
    response_ms: u64,
) -> crate::domain::TransmissionLog {
    use crate::domain::{
        FailureKind, TransmissionId, TransmissionLog, TransmissionRequest, TransmissionResult,
    };
    use chrono::Utc;
    use std::time::Duration;

    let request = TransmissionRequest::new(endpoint, "MSH|^~\\&|A", protocol);
    let elapsed = Duration::from_millis(response_ms);
    let result = if success {
        TransmissionResult::success(TransmissionId::generate(), None, elapsed, Utc::now())
    } else {
        TransmissionResult::failure(
            TransmissionId::generate(),
            FailureKind::Transport,
            "connection refused",
            elapsed,
            Utc::now(),
        )
    };
    TransmissionLog::from_outcome(&request, &result)
}
