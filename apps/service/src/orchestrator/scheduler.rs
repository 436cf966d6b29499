use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use super::CheckOrchestrator;
use crate::registry::TargetRegistry;

/// Periodic pass scheduler - reloads the registry and runs a pass on every tick
pub struct PassScheduler {
    orchestrator: CheckOrchestrator,
    registry: Arc<dyn TargetRegistry>,
    period: Duration,
}

/// Stops a running scheduler
#[derive(Clone)]
pub struct SchedulerHandle {
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl SchedulerHandle {
    /// Ask the scheduler to stop. A pass already running finishes first.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl PassScheduler {
    /// Create a new pass scheduler
    pub fn new(orchestrator: CheckOrchestrator, registry: Arc<dyn TargetRegistry>, period: Duration) -> Self {
        Self { orchestrator, registry, period }
    }

    /// Start the loop in the background. The first pass runs immediately.
    pub fn spawn(self) -> (tokio::task::JoinHandle<()>, SchedulerHandle) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(self.run(shutdown_rx));
        (handle, SchedulerHandle { shutdown_tx: Arc::new(shutdown_tx) })
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(period_secs = self.period.as_secs(), "scheduler started");

        let mut timer = interval(self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    debug!("scheduled check pass");
                    if let Err(e) = self.orchestrator.run_registry_pass(self.registry.as_ref()).await {
                        warn!(error = %e, "skipping scheduled pass, target registry unavailable");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("scheduler stopped");
    }
}
