//! Wiring shared by the binaries: builds the core services from a `Config`.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::{Config, Notify};
use crate::monitoring::ProbeExecutor;
use crate::notify::{FanoutSink, LogSink, NotificationSink, WebhookSink};
use crate::orchestrator::{CheckOrchestrator, PassScheduler};
use crate::registry::{JsonFileRegistry, TargetRegistry};
use crate::store::{FileStatusStore, MemoryStatusStore, StatusStore};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything needed to run passes, built once per process
#[derive(Clone)]
pub struct Services {
    pub orchestrator: CheckOrchestrator,
    pub registry: Arc<dyn TargetRegistry>,
    pub store: Arc<dyn StatusStore>,
    interval: Duration,
}

impl Services {
    /// `ephemeral` keeps statuses in memory instead of the status file.
    pub fn build(config: &Config, ephemeral: bool) -> Result<Self> {
        config.validate()?;

        let prober = Arc::new(
            ProbeExecutor::new(config.monitor.http_timeout(), config.monitor.ping_timeout())
                .context("Failed to create probe executor")?,
        );

        let store: Arc<dyn StatusStore> = if ephemeral {
            info!("Using in-memory status store");
            Arc::new(MemoryStatusStore::new())
        } else {
            info!(path = %config.storage.status_path.display(), "Using file status store");
            Arc::new(FileStatusStore::new(&config.storage.status_path))
        };

        let sink = build_sink(&config.notify)?;
        let registry: Arc<dyn TargetRegistry> = Arc::new(JsonFileRegistry::new(&config.storage.targets_path));

        let orchestrator = CheckOrchestrator::new(prober, store.clone(), sink, config.monitor.max_concurrency);

        Ok(Self { orchestrator, registry, store, interval: config.monitor.interval() })
    }

    /// Periodic scheduler over the configured registry
    pub fn scheduler(&self) -> PassScheduler {
        PassScheduler::new(self.orchestrator.clone(), self.registry.clone(), self.interval)
    }
}

fn build_sink(notify: &Notify) -> Result<Arc<dyn NotificationSink>> {
    let mut sink = FanoutSink::new();

    if notify.log_alerts {
        sink = sink.with(Arc::new(LogSink));
    }
    if let Some(url) = &notify.webhook_url {
        info!("Alerts will be posted to the configured webhook");
        let webhook = WebhookSink::new(url.clone(), WEBHOOK_TIMEOUT).context("Failed to create webhook client")?;
        sink = sink.with(Arc::new(webhook));
    }
    if sink.is_empty() {
        info!("No notification sink configured, alerts are dropped");
    }

    Ok(Arc::new(sink))
}
