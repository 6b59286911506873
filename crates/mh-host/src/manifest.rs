//! The instance manifest.
//!
//! One record per line:
//!
//! ```text
//! # comment
//! $verbose=1
//! 0;models/scrx9.so
//! 1;models/ieeest1a.so
//! ```
//!
//! Leading blanks are ignored, as are empty lines and lines starting with
//! `#`. Line numbers in errors are 1-based.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use mh_core::{InstanceId, Verbosity};
use tracing::debug;

use crate::error::{HostError, HostResult};

const VERBOSE_DIRECTIVE: &str = "$verbose=";

/// One `id;path` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub id: InstanceId,
    pub library: PathBuf,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Manifest {
    pub source: PathBuf,
    /// Last `$verbose=` directive, if any.
    pub verbosity: Option<Verbosity>,
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn read(path: &Path, capacity: usize) -> HostResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| HostError::ManifestRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path, capacity)
    }

    /// Parse manifest text; `source` only labels errors.
    pub fn parse(text: &str, source: &Path, capacity: usize) -> HostResult<Self> {
        let mut manifest = Manifest {
            source: source.to_path_buf(),
            ..Manifest::default()
        };
        let mut seen = HashSet::new();

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let record = raw.trim_start_matches([' ', '\t']).trim_end();
            let fail = |reason: String| HostError::ManifestLine {
                path: source.to_path_buf(),
                line,
                text: record.to_owned(),
                reason,
            };

            if record.is_empty() || record.starts_with('#') {
                continue;
            }

            if let Some(directive) = record.strip_prefix('$') {
                let level = record
                    .strip_prefix(VERBOSE_DIRECTIVE)
                    .ok_or_else(|| fail(format!("unknown directive '${directive}'")))?;
                let level: i64 = level
                    .trim()
                    .parse()
                    .map_err(|_| fail(format!("verbosity '{level}' is not an integer")))?;
                manifest.verbosity = Some(Verbosity::from_level(level));
                continue;
            }

            let (id, library) = record
                .split_once(';')
                .ok_or_else(|| fail("expected '<id>;<library path>'".into()))?;
            let id: u64 = id
                .trim()
                .parse()
                .map_err(|_| fail(format!("'{}' is not a non-negative integer id", id.trim())))?;
            let library = library.trim();
            if library.is_empty() {
                return Err(fail("missing library path".into()));
            }
            let max = capacity.saturating_sub(1);
            let id = u32::try_from(id)
                .ok()
                .filter(|&index| (index as usize) < capacity)
                .and_then(InstanceId::from_index)
                .ok_or_else(|| fail(format!("instance id = {id} is greater than max({max})")))?;
            if !seen.insert(id) {
                return Err(fail(format!("instance id = {} already in use", id.index())));
            }

            debug!(%id, library, line, "manifest entry");
            manifest.entries.push(ManifestEntry {
                id,
                library: PathBuf::from(library),
                line,
            });
        }
        Ok(manifest)
    }
}
