//! mh-host: runs component models inside a host simulation engine.
//!
//! Contains:
//! - manifest (the `id;library` list read before the first instance starts)
//! - arena (fixed-capacity instance table)
//! - lifecycle (per-instance state machine and return-code handling)
//! - scheduler (multi-rate firing, release window, termination)
//! - bridge (host log and abort primitives)
//! - adapter (host-facing `init`/`exec`)
//! - config, error

pub mod adapter;
pub mod arena;
pub mod bridge;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod manifest;
pub mod scheduler;

pub use adapter::Adapter;
pub use arena::Arena;
pub use bridge::{HostBridge, HostLog, RecordingBridge, TracingBridge};
pub use config::{DEFAULT_CAPACITY, DEFAULT_MANIFEST, HostConfig};
pub use error::{HostError, HostResult};
pub use lifecycle::{EMT_MODE, Instance, Phase};
pub use manifest::{Manifest, ManifestEntry};
pub use scheduler::{Firing, Schedule, Timing};
