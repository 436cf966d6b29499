use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;

use super::NotificationSink;
use crate::error::NotifyError;
use crate::monitoring::types::{AlertEvent, AlertKind};

const DOWN_COLOR: u32 = 0xE74C3C;
const RECOVERY_COLOR: u32 = 0x27AE60;

/// Posts alerts as JSON to a chat-style webhook (Discord/Slack compatible
/// `content` plus a Discord embed).
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url: url.into() })
    }
}

/// Request body for one alert
pub fn payload(event: &AlertEvent) -> Value {
    let (color, title) = match event.kind {
        AlertKind::Down => (DOWN_COLOR, "Service Critical Alert"),
        AlertKind::Recovery => (RECOVERY_COLOR, "Service Recovered"),
    };

    let mut fields = vec![
        json!({ "name": "Target", "value": event.target_name, "inline": true }),
        json!({ "name": "Address", "value": event.address, "inline": true }),
        json!({ "name": "Check", "value": event.check_kind.to_string(), "inline": true }),
    ];
    if let Some(downtime) = event.downtime() {
        fields.push(json!({ "name": "Downtime", "value": format!("{}s", downtime.num_seconds()), "inline": true }));
    }
    fields.push(json!({ "name": "Details", "value": event.detail, "inline": false }));

    json!({
        "username": "statuswatch",
        "content": event.subject(),
        "kind": event.kind,
        "target": event.target_name,
        "occurred_at": event.occurred_at.to_rfc3339(),
        "embeds": [{
            "title": title,
            "color": color,
            "fields": fields,
            "timestamp": event.occurred_at.to_rfc3339(),
        }]
    })
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn notify(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        let response = self.client.post(&self.url).json(&payload(event)).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(NotifyError::Rejected(response.status()))
        }
    }
}
