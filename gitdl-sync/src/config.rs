//! Engine configuration, passed explicitly into every sync entrypoint.

use std::path::{Path, PathBuf};

use gitdl_core::DEFAULT_REGISTRY_FILE;

/// Everything the engine needs to know about its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Location of the registry document.
    pub registry_path: PathBuf,
}

impl SyncConfig {
    pub fn new(registry_path: impl Into<PathBuf>) -> Self {
        Self {
            registry_path: registry_path.into(),
        }
    }

    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_FILE)
    }
}
