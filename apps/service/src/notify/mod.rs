//! Notification sinks - where alert edges are delivered.
//!
//! Delivery is fire-and-forget from the orchestrator's point of view: a
//! failing sink is logged by the caller and never retried.

pub mod webhook;

pub use webhook::WebhookSink;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, warn};

use crate::error::NotifyError;
use crate::monitoring::types::{AlertEvent, AlertKind};

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, event: &AlertEvent) -> Result<(), NotifyError>;
}

/// Writes alerts to the log. Always succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn notify(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        match event.kind {
            AlertKind::Down => error!(
                target_name = %event.target_name,
                address = %event.address,
                detail = %event.detail,
                "[ALERT] {} is DOWN",
                event.target_name
            ),
            AlertKind::Recovery => warn!(
                target_name = %event.target_name,
                address = %event.address,
                downtime_secs = event.downtime().map(|d| d.num_seconds()),
                "[RECOVERY] {} is back online",
                event.target_name
            ),
        }
        Ok(())
    }
}

/// Delivers every alert to each inner sink, reporting the first failure
/// only after all of them were tried.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl NotificationSink for FanoutSink {
    async fn notify(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.notify(event).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
