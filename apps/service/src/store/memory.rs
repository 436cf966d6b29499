use async_trait::async_trait;
use tokio::sync::Mutex;

use super::models::{StatusRecord, StatusSnapshot};
use super::{RecordUpdate, StatusStore, Updated};
use crate::error::StoreError;

/// In-process store for tests and `--ephemeral` runs. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStatusStore {
    records: Mutex<StatusSnapshot>,
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot
    pub fn with_records(records: StatusSnapshot) -> Self {
        Self { records: Mutex::new(records) }
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn read_all(&self) -> StatusSnapshot {
        self.records.lock().await.clone()
    }

    async fn get(&self, name: &str) -> StatusRecord {
        self.records.lock().await.get(name).cloned().unwrap_or_default()
    }

    async fn upsert(&self, name: &str, record: StatusRecord) -> Result<(), StoreError> {
        self.records.lock().await.insert(name.to_string(), record);
        Ok(())
    }

    async fn update(&self, name: &str, apply: RecordUpdate<'_>) -> Updated {
        let mut records = self.records.lock().await;
        let prior = records.get(name).cloned().unwrap_or_default();
        let evaluation = apply(&prior);
        records.insert(name.to_string(), evaluation.updated.clone());
        Updated { evaluation, persist_error: None }
    }
}
