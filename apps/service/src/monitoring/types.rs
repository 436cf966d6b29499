use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of reachability check performed against a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    #[default]
    Http,
    Ping,
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckKind::Http => write!(f, "http"),
            CheckKind::Ping => write!(f, "ping"),
        }
    }
}

/// A named endpoint under observation.
///
/// The serialized layout matches the registry file: `name`, `url` and an
/// optional `type` that defaults to `http`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Unique key of the target
    pub name: String,

    /// URL for HTTP checks, host name or IP for ping checks
    #[serde(rename = "url", alias = "address")]
    pub address: String,

    #[serde(rename = "type", default)]
    pub check_kind: CheckKind,
}

impl Target {
    pub fn new(name: impl Into<String>, address: impl Into<String>, check_kind: CheckKind) -> Self {
        Self { name: name.into(), address: address.into(), check_kind }
    }

    pub fn http(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(name, url, CheckKind::Http)
    }

    pub fn ping(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self::new(name, host, CheckKind::Ping)
    }
}

/// Outcome of a single probe. Consumed once by the transition detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub target_name: String,

    /// Whether the target answered as expected
    pub reachable: bool,

    /// Status code, transport error text or ping outcome
    pub detail: String,

    pub observed_at: DateTime<Utc>,
}

impl ProbeResult {
    /// Mark the target as reachable
    pub fn reachable(target_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            reachable: true,
            detail: detail.into(),
            observed_at: Utc::now(),
        }
    }

    /// Mark the target as unreachable
    pub fn unreachable(target_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { reachable: false, ..Self::reachable(target_name, detail) }
    }
}

/// Direction of an alert edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertKind {
    Down,
    Recovery,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::Down => write!(f, "DOWN"),
            AlertKind::Recovery => write!(f, "RECOVERY"),
        }
    }
}

/// Notification-worthy transition of a single target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub target_name: String,
    pub address: String,
    pub check_kind: CheckKind,
    pub detail: String,
    pub occurred_at: DateTime<Utc>,

    /// When the outage began, only set on recovery
    pub down_since: Option<DateTime<Utc>>,
}

impl AlertEvent {
    /// Length of the outage that just ended, if known
    pub fn downtime(&self) -> Option<chrono::Duration> {
        self.down_since.map(|since| self.occurred_at - since)
    }

    pub fn subject(&self) -> String {
        match self.kind {
            AlertKind::Down => format!("ALERT: {} is DOWN", self.target_name),
            AlertKind::Recovery => format!("RECOVERY: {} is ONLINE", self.target_name),
        }
    }
}
