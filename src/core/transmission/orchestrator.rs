//! Transmission orchestrator
//!
//! Runs one request through `Idle -> Attempting -> {Succeeded, Retrying,
//! Failed}`. Each attempt holds a concurrency slot and is raced against the
//! request's timeout and the cancellation signal. Exactly one audit log is
//! written per request once it reaches a terminal state.

use super::policy::RetryPolicy;
use crate::adapters::audit::SharedAuditRepository;
use crate::adapters::transport::{SharedProvider, TransmissionProviderFactory};
use crate::config::TransmissionConfig;
use crate::domain::{
    FailureKind, TransmissionError, TransmissionId, TransmissionLog, TransmissionRequest,
    TransmissionResult,
};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};
use tokio::time::Instant;

/// Orchestration state of a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmissionState {
    Idle,
    Attempting,
    Retrying,
    Succeeded,
    Failed,
}

impl TransmissionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for TransmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Attempting => "attempting",
            Self::Retrying => "retrying",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Applies retry, timeout and concurrency policy around provider calls
///
/// Clones share the same concurrency slots, so one orchestrator (or its
/// clones) bounds the whole process.
#[derive(Clone)]
pub struct TransmissionOrchestrator {
    factory: TransmissionProviderFactory,
    audit: Option<SharedAuditRepository>,
    policy: RetryPolicy,
    max_message_size: usize,
    slots: Arc<Semaphore>,
    shutdown: watch::Receiver<bool>,
}

impl TransmissionOrchestrator {
    pub fn new(
        config: &TransmissionConfig,
        factory: TransmissionProviderFactory,
        audit: Option<SharedAuditRepository>,
    ) -> Self {
        // A receiver whose sender is gone never reports cancellation
        let (_, shutdown) = watch::channel(false);
        Self {
            factory,
            audit,
            policy: RetryPolicy::from_config(config),
            max_message_size: config.max_message_size_bytes,
            slots: Arc::new(Semaphore::new(config.max_concurrent_transmissions.max(1))),
            shutdown,
        }
    }

    /// Cancels in-flight and future transmissions when the signal turns true
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn factory(&self) -> &TransmissionProviderFactory {
        &self.factory
    }

    pub fn audit(&self) -> Option<&SharedAuditRepository> {
        self.audit.as_ref()
    }

    /// Free concurrency slots
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Delivers a request under the orchestrator's shutdown signal
    pub async fn transmit(&self, request: &TransmissionRequest) -> TransmissionResult {
        self.transmit_with_cancel(request, self.shutdown.clone())
            .await
    }

    /// Delivers a request, aborting when `cancel` turns true
    ///
    /// Never returns an error: every outcome, including pre-flight
    /// rejections, is a [`TransmissionResult`].
    pub async fn transmit_with_cancel(
        &self,
        request: &TransmissionRequest,
        mut cancel: watch::Receiver<bool>,
    ) -> TransmissionResult {
        crate::log_transmission_start!(request);

        let provider = match self.preflight(request) {
            Ok(provider) => provider,
            Err(result) => {
                crate::log_transmission_complete!(request, &result);
                return result;
            }
        };

        let result = self.run(&provider, request, &mut cancel).await;
        self.record(request, &result).await;
        crate::log_transmission_complete!(request, &result);
        result
    }

    /// Checks that fail before any attempt; these are not audited
    fn preflight(
        &self,
        request: &TransmissionRequest,
    ) -> std::result::Result<SharedProvider, TransmissionResult> {
        let provider = self
            .factory
            .create_provider(request.protocol())
            .map_err(|e| rejected_before_attempt(FailureKind::UnsupportedProtocol, e.to_string()))?;

        let size = request.message_size();
        if size > self.max_message_size {
            let error = TransmissionError::MessageTooLarge {
                size,
                limit: self.max_message_size,
            };
            return Err(rejected_before_attempt(
                FailureKind::InvalidRequest,
                error.to_string(),
            ));
        }

        Ok(provider)
    }

    async fn run(
        &self,
        provider: &SharedProvider,
        request: &TransmissionRequest,
        cancel: &mut watch::Receiver<bool>,
    ) -> TransmissionResult {
        let mut state = TransmissionState::Idle;
        let mut attempt: u32 = 0;

        loop {
            if *cancel.borrow() {
                transition(request, &mut state, TransmissionState::Failed, attempt);
                return cancelled(attempt, "cancellation requested before attempt");
            }

            attempt += 1;
            transition(request, &mut state, TransmissionState::Attempting, attempt);

            let result = tokio::select! {
                biased;
                _ = cancellation(cancel) => {
                    cancelled(attempt, &format!("cancellation requested during attempt {attempt}"))
                }
                result = self.attempt(provider, request) => result.with_attempts(attempt),
            };

            if result.success {
                transition(request, &mut state, TransmissionState::Succeeded, attempt);
                return result;
            }

            if !self.policy.should_retry(&result, attempt) {
                transition(request, &mut state, TransmissionState::Failed, attempt);
                return self.final_failure(result, attempt);
            }

            transition(request, &mut state, TransmissionState::Retrying, attempt);
            crate::log_retry_attempt!(
                attempt + 1,
                self.policy.max_attempts,
                result.error_message.as_deref().unwrap_or_default()
            );

            tokio::select! {
                biased;
                _ = cancellation(cancel) => {
                    transition(request, &mut state, TransmissionState::Failed, attempt);
                    return cancelled(attempt, &format!("cancellation requested after attempt {attempt}"));
                }
                _ = tokio::time::sleep(self.policy.delay) => {}
            }
        }
    }

    /// One provider call under a concurrency slot and the request timeout
    async fn attempt(
        &self,
        provider: &SharedProvider,
        request: &TransmissionRequest,
    ) -> TransmissionResult {
        let _permit = match self.slots.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return TransmissionResult::failure(
                    TransmissionId::generate(),
                    FailureKind::Cancelled,
                    TransmissionError::Cancelled("orchestrator is shutting down".into())
                        .to_string(),
                    std::time::Duration::ZERO,
                    Utc::now(),
                )
            }
        };

        // response time excludes waiting for a slot
        let sent_at = Utc::now();
        let started = Instant::now();

        match tokio::time::timeout(request.timeout(), provider.send(request)).await {
            Ok(result) => result,
            Err(_) => TransmissionResult::failure(
                TransmissionId::generate(),
                FailureKind::Timeout,
                TransmissionError::Timeout(request.timeout_seconds()).to_string(),
                started.elapsed(),
                sent_at,
            ),
        }
    }

    /// Rewrites the message of a failure that used up the retry budget
    fn final_failure(&self, mut result: TransmissionResult, attempts: u32) -> TransmissionResult {
        if self.policy.is_retryable(&result) && attempts >= self.policy.max_attempts {
            let kind = result.failure_kind.unwrap_or(FailureKind::Transport);
            let cause = result.error_message.take().unwrap_or_default();
            result.error_message = Some(format!(
                "Transmission failed after {attempts} attempt(s) ({kind}): {cause}"
            ));
        }
        result
    }

    async fn record(&self, request: &TransmissionRequest, result: &TransmissionResult) {
        let Some(audit) = &self.audit else {
            return;
        };
        let log = TransmissionLog::from_outcome(request, result);
        if let Err(e) = audit.save(&log).await {
            crate::log_error_with_context!(&e, "Failed to write transmission audit log");
        }
    }
}

fn transition(
    request: &TransmissionRequest,
    state: &mut TransmissionState,
    next: TransmissionState,
    attempt: u32,
) {
    tracing::debug!(
        request_id = %request.request_id(),
        attempt,
        from = %state,
        to = %next,
        "Transmission state changed"
    );
    *state = next;
}

/// Resolves once `cancel` is true; pends forever if the sender is gone
async fn cancellation(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn cancelled(attempts: u32, reason: &str) -> TransmissionResult {
    TransmissionResult::failure(
        TransmissionId::generate(),
        FailureKind::Cancelled,
        TransmissionError::Cancelled(reason.to_string()).to_string(),
        std::time::Duration::ZERO,
        Utc::now(),
    )
    .with_attempts(attempts)
}

fn rejected_before_attempt(kind: FailureKind, message: String) -> TransmissionResult {
    TransmissionResult::failure(
        TransmissionId::generate(),
        kind,
        message,
        std::time::Duration::ZERO,
        Utc::now(),
    )
    .with_attempts(0)
}
