//! Target registry - where the list of monitored targets comes from.

use async_trait::async_trait;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::RegistryError;
use crate::monitoring::types::Target;
use crate::monitoring::validation::validate_target;

/// Read-only source of targets, consulted once per pass
#[async_trait]
pub trait TargetRegistry: Send + Sync {
    async fn list_targets(&self) -> Result<Vec<Target>, RegistryError>;
}

/// Fixed list of targets
pub struct StaticRegistry {
    targets: Vec<Target>,
}

impl StaticRegistry {
    pub fn new(targets: Vec<Target>) -> Self {
        Self { targets }
    }
}

#[async_trait]
impl TargetRegistry for StaticRegistry {
    async fn list_targets(&self) -> Result<Vec<Target>, RegistryError> {
        Ok(self.targets.clone())
    }
}

/// `machines.json` style registry: a JSON array of `{name, url, type}`.
///
/// The file is re-read on every call so edits apply on the next pass. A
/// missing file means no targets.
pub struct JsonFileRegistry {
    path: PathBuf,
}

impl JsonFileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TargetRegistry for JsonFileRegistry {
    async fn list_targets(&self) -> Result<Vec<Target>, RegistryError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "target registry absent, nothing to check");
                return Ok(Vec::new());
            }
            Err(source) => return Err(RegistryError::Read { path: self.path.clone(), source }),
        };

        let targets: Vec<Target> = serde_json::from_slice(&raw)
            .map_err(|source| RegistryError::Parse { path: self.path.clone(), source })?;

        Ok(sanitize(targets))
    }
}

/// Drop entries that cannot be probed and flag duplicate names.
pub fn sanitize(targets: Vec<Target>) -> Vec<Target> {
    let mut seen = HashSet::new();

    targets
        .into_iter()
        .filter(|target| match validate_target(target) {
            Ok(()) => true,
            Err(e) => {
                warn!(target_name = %target.name, error = %e, "skipping invalid target");
                false
            }
        })
        .inspect(|target| {
            if !seen.insert(target.name.clone()) {
                warn!(target_name = %target.name, "duplicate target name, entries share one status record");
            }
        })
        .collect()
}
