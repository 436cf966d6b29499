use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::checker::{Checker, HttpChecker, PingChecker};
use super::types::{CheckKind, ProbeResult, Target};

/// Anything able to turn a target into a probe result.
///
/// Implementations must never fail: every problem is reported as an
/// unreachable result with a readable detail.
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &Target) -> ProbeResult;
}

/// Probe executor - runs one check against one target
pub struct ProbeExecutor {
    http_checker: Arc<HttpChecker>,
    ping_checker: Arc<PingChecker>,
}

impl ProbeExecutor {
    /// Create a new probe executor
    pub fn new(http_timeout: Duration, ping_timeout: Duration) -> Result<Self> {
        Ok(Self {
            http_checker: Arc::new(HttpChecker::new(http_timeout)?),
            ping_checker: Arc::new(PingChecker::new(ping_timeout)),
        })
    }

    fn checker_for(&self, kind: CheckKind) -> &dyn Checker {
        match kind {
            CheckKind::Http => self.http_checker.as_ref(),
            CheckKind::Ping => self.ping_checker.as_ref(),
        }
    }
}

#[async_trait::async_trait]
impl Prober for ProbeExecutor {
    async fn probe(&self, target: &Target) -> ProbeResult {
        let result = match self.checker_for(target.check_kind).check(&target.address).await {
            Ok(detail) => ProbeResult::reachable(&target.name, detail),
            Err(e) => ProbeResult::unreachable(&target.name, format!("{e:#}")),
        };

        debug!(
            target_name = %target.name,
            kind = %target.check_kind,
            reachable = result.reachable,
            detail = %result.detail,
            "probe finished"
        );

        result
    }
}
