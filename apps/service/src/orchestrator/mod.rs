//! Check orchestrator - runs passes over the registered targets
//!
//! A pass probes every target with bounded concurrency, folds each result
//! into the status store through the transition detector and hands alert
//! edges to the notification sink. Overlapping passes (a scheduled one and an
//! on-demand one) are safe because the transition rule runs inside the
//! store's load-modify-save cycle, and alerts go out after the lock is
//! released.

pub mod scheduler;

#[cfg(test)]
mod tests;

pub use scheduler::{PassScheduler, SchedulerHandle};

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::error::{RegistryError, StoreError};
use crate::monitoring::transition::{Evaluation, evaluate};
use crate::monitoring::types::Target;
use crate::monitoring::Prober;
use crate::notify::NotificationSink;
use crate::registry::TargetRegistry;
use crate::store::{Status, StatusRecord, StatusStore, Updated};

/// Default number of probes allowed in flight at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Target metadata merged with its freshly evaluated record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetStatus {
    #[serde(flatten)]
    pub target: Target,
    #[serde(flatten)]
    pub record: StatusRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// The evaluated record could not be written to the store
    Persist,
    /// The task checking the target died before producing a result
    Worker,
}

/// Something that went wrong for one target during a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassFailure {
    pub target_name: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Everything a caller learns from one pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct PassReport {
    /// One entry per target, in input order
    pub statuses: Vec<TargetStatus>,
    pub failures: Vec<PassFailure>,
    /// Number of alert edges detected
    pub alerts: usize,
}

impl PassReport {
    pub fn online_count(&self) -> usize {
        self.statuses.iter().filter(|s| s.record.status == Status::Online).count()
    }

    /// Whether every evaluated record reached the store
    pub fn is_fully_persisted(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of checking one target inside a pass
struct TargetOutcome {
    status: TargetStatus,
    alerted: bool,
    persist_error: Option<StoreError>,
}

/// Main orchestrator. Cheap to clone; clones share the concurrency budget.
#[derive(Clone)]
pub struct CheckOrchestrator {
    prober: Arc<dyn Prober>,
    store: Arc<dyn StatusStore>,
    sink: Arc<dyn NotificationSink>,
    limiter: Arc<Semaphore>,
}

impl CheckOrchestrator {
    /// `max_concurrency` is clamped to at least one probe.
    pub fn new(
        prober: Arc<dyn Prober>,
        store: Arc<dyn StatusStore>,
        sink: Arc<dyn NotificationSink>,
        max_concurrency: usize,
    ) -> Self {
        Self { prober, store, sink, limiter: Arc::new(Semaphore::new(max_concurrency.max(1))) }
    }

    pub fn store(&self) -> &Arc<dyn StatusStore> {
        &self.store
    }

    /// Load targets from `registry` and run a pass over them
    pub async fn run_registry_pass(&self, registry: &dyn TargetRegistry) -> Result<PassReport, RegistryError> {
        let targets = registry.list_targets().await?;
        Ok(self.run_pass(&targets).await)
    }

    /// Check every target once. Never fails as a whole: per-target problems
    /// are listed in the report next to the statuses that were measured.
    pub async fn run_pass(&self, targets: &[Target]) -> PassReport {
        let started = Instant::now();
        debug!(targets = targets.len(), "starting check pass");

        let handles: Vec<_> = targets
            .iter()
            .cloned()
            .map(|target| {
                let this = self.clone();
                tokio::spawn(async move { this.check_target(target).await })
            })
            .collect();

        let outcomes = futures::future::join_all(handles).await;

        let mut report = PassReport::default();
        for (target, outcome) in targets.iter().zip(outcomes) {
            match outcome {
                Ok(outcome) => {
                    if outcome.alerted {
                        report.alerts += 1;
                    }
                    if let Some(e) = outcome.persist_error {
                        report.failures.push(PassFailure {
                            target_name: target.name.clone(),
                            kind: FailureKind::Persist,
                            message: e.to_string(),
                        });
                    }
                    report.statuses.push(outcome.status);
                }
                Err(e) => {
                    error!(target_name = %target.name, error = %e, "check task failed");
                    report.failures.push(PassFailure {
                        target_name: target.name.clone(),
                        kind: FailureKind::Worker,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            targets = targets.len(),
            online = report.online_count(),
            alerts = report.alerts,
            failures = report.failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "check pass completed"
        );

        report
    }

    async fn check_target(&self, target: Target) -> TargetOutcome {
        let result = {
            // The semaphore is never closed, so acquiring cannot fail.
            let _permit = self.limiter.acquire().await.ok();
            self.prober.probe(&target).await
        };

        // Read, evaluate and write under the store's lock so overlapping
        // passes cannot both act on the same prior state.
        let Updated { evaluation: Evaluation { updated, alert }, persist_error } = self
            .store
            .update(&target.name, Box::new(|prior: &StatusRecord| evaluate(prior, &result, &target, Utc::now())))
            .await;
        if let Some(e) = &persist_error {
            error!(target_name = %target.name, error = %e, "failed to persist status, next pass may re-alert");
        }

        let alerted = alert.is_some();
        if let Some(event) = alert {
            info!(target_name = %event.target_name, kind = %event.kind, "alert edge detected");
            if let Err(e) = self.sink.notify(&event).await {
                error!(target_name = %event.target_name, kind = %event.kind, error = %e, "failed to deliver alert");
            }
        }

        TargetOutcome { status: TargetStatus { target, record: updated }, alerted, persist_error }
    }
}
