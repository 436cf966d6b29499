//! Transition detection - turns a probe result into the next stored record
//! and decides whether that change is worth an alert.
//!
//! Alerts fire on edges only. A target seen for the first time alerts when it
//! is down, but stays silent when it is up: an initial success is not a
//! recovery.

use chrono::{DateTime, Utc};

use super::types::{AlertEvent, AlertKind, ProbeResult, Target};
use crate::store::{Status, StatusRecord};

/// Outcome of evaluating one probe against the stored state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub updated: StatusRecord,
    pub alert: Option<AlertEvent>,
}

/// Pure transition rule, see the module docs.
pub fn evaluate(prior: &StatusRecord, result: &ProbeResult, target: &Target, now: DateTime<Utc>) -> Evaluation {
    let new_status = if result.reachable { Status::Online } else { Status::Offline };
    let mut updated = prior.clone();

    let alert_kind = match (prior.status, new_status) {
        (prior_status, Status::Offline) if prior_status != Status::Offline => {
            updated.last_offline = Some(now);
            Some(AlertKind::Down)
        }
        (Status::Offline, Status::Online) => Some(AlertKind::Recovery),
        _ => None,
    };

    if new_status == Status::Online {
        updated.last_success = Some(now);
    }

    updated.status = new_status;
    updated.last_check = Some(now);

    let alert = alert_kind.map(|kind| AlertEvent {
        kind,
        target_name: target.name.clone(),
        address: target.address.clone(),
        check_kind: target.check_kind,
        detail: match kind {
            AlertKind::Down => format!("Type: {}\nError: {}", target.check_kind, result.detail),
            AlertKind::Recovery => "Service is reachable.\nDowntime ended.".to_string(),
        },
        occurred_at: now,
        down_since: match kind {
            AlertKind::Down => None,
            AlertKind::Recovery => prior.last_offline,
        },
    });

    Evaluation { updated, alert }
}
