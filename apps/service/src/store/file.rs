use async_trait::async_trait;
use serde::Serialize;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::models::{StatusRecord, StatusSnapshot, default_record};
use super::{RecordUpdate, StatusStore, Updated};
use crate::error::StoreError;

/// JSON file backed status store.
///
/// Clones share one lock, so a single instance should be created per file
/// and handed to every caller in the process. Writes land in a sibling temp
/// file that is renamed over the real one, so readers only ever see complete
/// documents.
#[derive(Clone)]
pub struct FileStatusStore {
    path: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
}

impl FileStatusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: Arc::new(path.into()), lock: Arc::new(Mutex::new(())) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(OsString::from).unwrap_or_else(|| OsString::from("status"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Load the snapshot. Callers must hold `lock`.
    async fn load(&self) -> StatusSnapshot {
        let bytes = match tokio::fs::read(self.path.as_ref()).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "status store absent, starting empty");
                return StatusSnapshot::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "status store unreadable, treating as empty");
                return StatusSnapshot::new();
            }
        };

        decode_snapshot(&bytes, &self.path)
    }

    /// Persist the snapshot. Callers must hold `lock`.
    async fn save(&self, snapshot: &StatusSnapshot) -> Result<(), StoreError> {
        let encoded = encode_snapshot(snapshot)?;
        let write_err = |source| StoreError::Write { path: self.path.to_path_buf(), source };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, encoded).await.map_err(write_err)?;
        if let Err(e) = tokio::fs::rename(&temp, self.path.as_ref()).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(write_err(e));
        }

        Ok(())
    }
}

#[async_trait]
impl StatusStore for FileStatusStore {
    async fn read_all(&self) -> StatusSnapshot {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn upsert(&self, name: &str, record: StatusRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;

        let mut snapshot = self.load().await;
        snapshot.insert(name.to_string(), record);
        self.save(&snapshot).await
    }

    async fn update(&self, name: &str, apply: RecordUpdate<'_>) -> Updated {
        let _guard = self.lock.lock().await;

        let mut snapshot = self.load().await;
        let prior = snapshot.get(name).cloned().unwrap_or_else(default_record);
        let evaluation = apply(&prior);
        snapshot.insert(name.to_string(), evaluation.updated.clone());

        let persist_error = self.save(&snapshot).await.err();
        Updated { evaluation, persist_error }
    }
}

/// Decode a stored document, dropping whatever cannot be understood.
fn decode_snapshot(bytes: &[u8], path: &Path) -> StatusSnapshot {
    let document: serde_json::Value = match serde_json::from_slice(bytes) {
        Ok(document) => document,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "status store is corrupt, treating as empty");
            return StatusSnapshot::new();
        }
    };

    let serde_json::Value::Object(entries) = document else {
        warn!(path = %path.display(), "status store is not a JSON object, treating as empty");
        return StatusSnapshot::new();
    };

    entries
        .into_iter()
        .filter_map(|(name, raw)| match serde_json::from_value::<StatusRecord>(raw) {
            Ok(record) => Some((name, record)),
            Err(e) => {
                warn!(path = %path.display(), target_name = %name, error = %e, "dropping undecodable status entry");
                None
            }
        })
        .collect()
}

fn encode_snapshot(snapshot: &StatusSnapshot) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    snapshot.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(buf)
}
