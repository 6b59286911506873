//! Fixed-capacity table of instances, indexed by manifest id.

use std::path::PathBuf;

use mh_core::InstanceId;
use tracing::debug;

use crate::error::{HostError, HostResult};
use crate::lifecycle::Instance;
use crate::manifest::Manifest;

/// Instance table with one slot per possible manifest id.
///
/// Slots are never moved or reused; an id maps to the same [`Instance`] for
/// the whole run.
#[derive(Debug)]
pub struct Arena {
    slots: Vec<Option<Instance>>,
}

impl Arena {
    /// Create an arena with `capacity` empty slots (ids `0..capacity`).
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(capacity).collect(),
        }
    }

    /// Arena holding every entry of `manifest`.
    pub fn from_manifest(manifest: &Manifest, capacity: usize) -> HostResult<Self> {
        let mut arena = Self::new(capacity);
        arena.load(manifest)?;
        Ok(arena)
    }

    /// Number of slots, used or not.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Reserve slot `id` for `library`. An occupied slot is left untouched.
    pub fn register(&mut self, id: InstanceId, library: impl Into<PathBuf>) -> HostResult<()> {
        let capacity = self.capacity();
        let slot = self
            .slots
            .get_mut(id.slot())
            .ok_or(HostError::CapacityExceeded { id, capacity })?;
        if let Some(existing) = slot {
            return Err(HostError::AlreadyRegistered {
                id,
                existing: existing.library().to_path_buf(),
            });
        }
        let instance = slot.insert(Instance::new(id, library));
        debug!(%id, library = %instance.library().display(), "instance registered");
        Ok(())
    }

    /// Register every manifest entry; errors carry the entry's line.
    pub fn load(&mut self, manifest: &Manifest) -> HostResult<()> {
        for entry in &manifest.entries {
            self.register(entry.id, entry.library.clone())
                .map_err(|err| HostError::ManifestLine {
                    path: manifest.source.clone(),
                    line: entry.line,
                    text: format!("{};{}", entry.id.index(), entry.library.display()),
                    reason: err.to_string(),
                })?;
        }
        Ok(())
    }

    /// Look up `id`.
    ///
    /// # Errors
    ///
    /// [`HostError::Unregistered`] if the manifest never declared `id`.
    pub fn get(&self, id: InstanceId) -> HostResult<&Instance> {
        self.slots
            .get(id.slot())
            .and_then(Option::as_ref)
            .ok_or(HostError::Unregistered { id })
    }

    pub fn get_mut(&mut self, id: InstanceId) -> HostResult<&mut Instance> {
        self.slots
            .get_mut(id.slot())
            .and_then(Option::as_mut)
            .ok_or(HostError::Unregistered { id })
    }

    /// Registered instances in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.slots.iter().flatten()
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Clean up every instance that still holds a library.
    ///
    /// Returns the ids that were cleaned, in id order.
    pub fn sweep(&mut self) -> Vec<InstanceId> {
        self.slots
            .iter_mut()
            .flatten()
            .filter_map(|instance| instance.cleanup().then(|| instance.id()))
            .collect()
    }
}
