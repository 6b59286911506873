//! Host log verbosity, set by the manifest's `$verbose=` directive.

/// How much the adapter appends to the host log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Verbosity {
    /// Only mandatory lines (model names, model messages, errors).
    #[default]
    Silent,
    /// Timing parameters, field counts, manifest listing.
    Info,
    /// Cleanup traces and other per-call detail.
    Debug,
}

impl Verbosity {
    /// Map a numeric level; anything below 1 is silent, anything above 2 is debug.
    pub fn from_level(level: i64) -> Self {
        match level {
            i64::MIN..=0 => Verbosity::Silent,
            1 => Verbosity::Info,
            _ => Verbosity::Debug,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Verbosity::Silent => 0,
            Verbosity::Info => 1,
            Verbosity::Debug => 2,
        }
    }

    pub fn shows(self, required: Verbosity) -> bool {
        self >= required
    }
}
