//! Error types for layout and marshaling.

use mh_core::Role;
use thiserror::Error;

/// Result type for layout and marshaling operations.
pub type LayoutResult<T> = Result<T, LayoutError>;

/// Errors raised while sizing or accessing packed buffers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    /// A field declared a type tag with no fixed native size.
    #[error("Field '{field}' (position {index}) has unrecognized data type tag {tag}")]
    UnknownFieldType {
        field: String,
        index: usize,
        tag: i32,
    },

    /// The host array is shorter than the region the model's fields need.
    #[error(
        "{role} region needs {needed} host values starting at index {start}, but the host array holds {available}"
    )]
    RegionTooShort {
        role: Role,
        start: usize,
        needed: usize,
        available: usize,
    },

    /// The host supplied more values than the model declared.
    #[error("{role} region expects exactly {expected} host values, got {got}")]
    RegionMismatch {
        role: Role,
        expected: usize,
        got: usize,
    },

    /// Field access past the end of a buffer.
    #[error("Access of {size} bytes at offset {offset} exceeds buffer of {len} bytes")]
    OutOfBounds { offset: usize, size: usize, len: usize },

    /// Field index past the end of a layout.
    #[error("Field index {index} out of range for {role} layout with {len} fields")]
    FieldIndex { role: Role, index: usize, len: usize },

    /// Value of the wrong native type written to a field.
    #[error("Field '{field}' holds {expected}, cannot store {got}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        got: &'static str,
    },

    /// Host state array too small for the model's requested states.
    #[error("State memory needs {needed} host slots, host provided {available}")]
    StateMemoryTooSmall { needed: usize, available: usize },

    /// State index past the end of its view.
    #[error("{kind} state index {index} out of range ({len} states)")]
    StateIndex {
        kind: &'static str,
        index: usize,
        len: usize,
    },
}
