//! Status store - durable mapping from target name to last known state
//!
//! Every implementation runs its load-modify-save cycle as one critical
//! section, so concurrent upserts for different targets never lose each
//! other's entries. `update` extends that section around the transition
//! rule itself, so two passes racing on one target see each other's result.

pub mod file;
pub mod memory;
pub mod models;

pub use file::FileStatusStore;
pub use memory::MemoryStatusStore;
pub use models::{Status, StatusRecord, StatusSnapshot, default_record};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::monitoring::transition::Evaluation;

/// Computes the next record from the stored one. Runs while the store is locked.
pub type RecordUpdate<'a> = Box<dyn FnOnce(&StatusRecord) -> Evaluation + Send + 'a>;

/// What `update` computed, and the write error if it was not persisted
#[derive(Debug)]
pub struct Updated {
    pub evaluation: Evaluation,
    pub persist_error: Option<StoreError>,
}

#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Consistent snapshot of every stored record. Unreadable backing data
    /// reads as an empty mapping.
    async fn read_all(&self) -> StatusSnapshot;

    /// Record for one target, `default_record()` if it was never stored
    async fn get(&self, name: &str) -> StatusRecord {
        self.read_all().await.remove(name).unwrap_or_else(default_record)
    }

    /// Replace or insert one record, persisting the whole mapping
    async fn upsert(&self, name: &str, record: StatusRecord) -> Result<(), StoreError>;

    /// Read the record for `name`, apply `apply` and store its result, all
    /// inside one critical section. The evaluation is returned even when the
    /// write fails.
    async fn update(&self, name: &str, apply: RecordUpdate<'_>) -> Updated;
}
