use anyhow::{Result, anyhow};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::validation::validate_ping_address;

/// Detail reported for every failed ping, whatever the underlying cause
pub const PING_FAILED: &str = "Request Timed Out (Ping Failed)";

/// Detail reported for a successful ping
pub const PING_OK: &str = "Echo reply received";

/// Extra time granted to the ping process on top of its own timeout
const PING_GRACE: Duration = Duration::from_secs(1);

/// Checker trait for the different kinds of reachability checks
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    /// Perform the check. `Ok` carries the success detail, `Err` the reason
    /// the target is considered unreachable.
    async fn check(&self, address: &str) -> Result<String>;
}

/// HTTP/HTTPS checker
pub struct HttpChecker {
    client: reqwest::Client,
}

impl HttpChecker {
    pub fn new(timeout_duration: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout_duration)
            .user_agent(concat!("statuswatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Checker for HttpChecker {
    async fn check(&self, address: &str) -> Result<String> {
        let response = self.client.get(address).send().await.map_err(anyhow::Error::new)?;

        let status_code = response.status().as_u16();

        // Only an exact 200 counts, redirects and other 2xx do not
        if status_code == 200 {
            Ok(format!("Status Code: {status_code}"))
        } else {
            Err(anyhow!("Status Code: {status_code}"))
        }
    }
}

/// ICMP echo checker backed by the platform `ping` binary, which avoids
/// needing raw socket privileges in the monitor process.
pub struct PingChecker {
    timeout_duration: Duration,
}

impl PingChecker {
    pub fn new(timeout_duration: Duration) -> Self {
        Self { timeout_duration }
    }
}

/// Arguments for a single echo request bounded by `wait`.
pub fn ping_args(host: &str, wait: Duration) -> Vec<String> {
    let secs = wait.as_secs().max(1).to_string();
    let mut args: Vec<String> = if cfg!(windows) {
        vec!["-n".into(), "1".into(), "-w".into(), wait.as_millis().max(1).to_string()]
    } else if cfg!(target_os = "macos") {
        vec!["-c".into(), "1".into(), "-t".into(), secs]
    } else {
        vec!["-c".into(), "1".into(), "-W".into(), secs]
    };
    args.push(host.to_string());
    args
}

#[async_trait::async_trait]
impl Checker for PingChecker {
    async fn check(&self, address: &str) -> Result<String> {
        // Never hand ping something it could parse as an option
        if let Err(e) = validate_ping_address(address) {
            debug!(host = %address, error = %e, "refusing to ping invalid host");
            return Err(anyhow!(PING_FAILED));
        }

        let mut command = Command::new("ping");
        command
            .args(ping_args(address, self.timeout_duration))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match timeout(self.timeout_duration + PING_GRACE, command.status()).await {
            Ok(Ok(status)) if status.success() => Ok(PING_OK.to_string()),
            Ok(Ok(status)) => {
                debug!(host = %address, ?status, "ping exited without reply");
                Err(anyhow!(PING_FAILED))
            }
            Ok(Err(e)) => {
                debug!(host = %address, error = %e, "failed to run ping");
                Err(anyhow!(PING_FAILED))
            }
            Err(_) => {
                debug!(host = %address, "ping process timed out");
                Err(anyhow!(PING_FAILED))
            }
        }
    }
}
