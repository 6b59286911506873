//! Error types for the host adapter.

use std::path::PathBuf;

use mh_abi::{BindError, LifecycleCall};
use mh_core::{CoreError, InstanceId};
use mh_layout::LayoutError;

use crate::lifecycle::Phase;

/// Every failure the adapter can hit. All of them stop the simulation.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Could not open '{}' file", path.display())]
    ManifestRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in line {line} of '{}': {text} ; {reason}", path.display())]
    ManifestLine {
        path: PathBuf,
        line: usize,
        text: String,
        reason: String,
    },

    #[error("Instance {id} does not fit an arena of {capacity} slots")]
    CapacityExceeded { id: InstanceId, capacity: usize },

    #[error("Instance {id} already in use by \"{}\"", existing.display())]
    AlreadyRegistered { id: InstanceId, existing: PathBuf },

    #[error("Error using an instance {id} not declared in the manifest")]
    Unregistered { id: InstanceId },

    #[error("Instance {id}: This instance was already initialized")]
    AlreadyBound { id: InstanceId },

    #[error("Instance {id}: cannot {operation} while {phase}")]
    OutOfOrder {
        id: InstanceId,
        operation: &'static str,
        phase: Phase,
    },

    #[error("Instance {id}: In call to '{call}': {message}")]
    Model {
        id: InstanceId,
        call: LifecycleCall,
        message: String,
    },

    #[error("Instance {id}: {source}")]
    Layout {
        id: InstanceId,
        #[source]
        source: LayoutError,
    },

    #[error("Invalid host array: {0}")]
    HostArray(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Simulation already stopped after a fatal error")]
    Aborted,
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;

impl HostError {
    pub(crate) fn layout(id: InstanceId) -> impl FnOnce(LayoutError) -> HostError {
        move |source| HostError::Layout { id, source }
    }
}
