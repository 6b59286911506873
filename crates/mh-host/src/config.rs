//! Adapter configuration.

use std::path::PathBuf;

use mh_core::Verbosity;
use serde::{Deserialize, Serialize};

use crate::error::{HostError, HostResult};

/// Manifest read when the first instance is initialized.
pub const DEFAULT_MANIFEST: &str = "icdll_list.txt";

/// Number of arena slots.
pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Manifest listing `id;library` entries.
    pub manifest_path: PathBuf,
    /// Arena capacity; manifest ids must be below it.
    pub capacity: usize,
    /// Verbosity until the manifest sets its own.
    pub verbosity: Verbosity,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from(DEFAULT_MANIFEST),
            capacity: DEFAULT_CAPACITY,
            verbosity: Verbosity::default(),
        }
    }
}

impl HostConfig {
    pub fn with_manifest(path: impl Into<PathBuf>) -> Self {
        Self {
            manifest_path: path.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> HostResult<()> {
        if self.capacity == 0 || u32::try_from(self.capacity).is_err() {
            return Err(HostError::Config(format!(
                "arena capacity must be between 1 and {}, got {}",
                u32::MAX,
                self.capacity
            )));
        }
        if self.manifest_path.as_os_str().is_empty() {
            return Err(HostError::Config("manifest path is empty".into()));
        }
        Ok(())
    }
}
