use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Last known availability of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Status {
    #[default]
    Unknown,
    Online,
    Offline,
}

impl From<String> for Status {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "online" => Status::Online,
            "offline" => Status::Offline,
            _ => Status::Unknown,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Unknown => write!(f, "Unknown"),
            Status::Online => write!(f, "Online"),
            Status::Offline => write!(f, "Offline"),
        }
    }
}

/// Persisted state of one target. `None` timestamps mean "never".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusRecord {
    pub status: Status,

    #[serde(with = "never_or_time")]
    pub last_check: Option<DateTime<Utc>>,

    #[serde(with = "never_or_time")]
    pub last_success: Option<DateTime<Utc>>,

    #[serde(with = "never_or_time")]
    pub last_offline: Option<DateTime<Utc>>,
}

/// Record assumed for a target that has never been evaluated
pub fn default_record() -> StatusRecord {
    StatusRecord { status: Status::Unknown, last_check: None, last_success: None, last_offline: None }
}

impl Default for StatusRecord {
    fn default() -> Self {
        default_record()
    }
}

/// Full persisted mapping, target name to record
pub type StatusSnapshot = BTreeMap<String, StatusRecord>;

/// Serde adapter writing `"Never"` for missing timestamps.
///
/// Reading accepts RFC 3339, the legacy `YYYY-MM-DD HH:MM:SS` local time,
/// `null` and any casing of `never`. Unparseable values read as never.
pub mod never_or_time {
    use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const NEVER: &str = "Never";
    const LEGACY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(at) => serializer.serialize_str(&at.to_rfc3339()),
            None => serializer.serialize_str(NEVER),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case(NEVER) {
            return None;
        }

        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return Some(at.with_timezone(&Utc));
        }

        NaiveDateTime::parse_from_str(raw, LEGACY_FORMAT)
            .ok()
            .and_then(|naive| Local.from_local_datetime(&naive).earliest())
            .map(|at| at.with_timezone(&Utc))
    }
}
