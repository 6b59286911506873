//! Error types for library binding.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for binding operations.
pub type BindResult<T> = Result<T, BindError>;

/// Errors raised while loading a component model.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BindError {
    /// The shared library could not be opened.
    #[error("Cannot load library \"{}\": {message}", path.display())]
    LibraryLoad { path: PathBuf, message: String },

    /// A required entry point is not exported.
    #[error("Cannot locate '{symbol}' function in library \"{}\"", path.display())]
    MissingSymbol { path: PathBuf, symbol: &'static str },

    /// The model's self-description is unusable.
    #[error("Invalid model metadata in \"{}\": {what}", path.display())]
    InvalidMetadata { path: PathBuf, what: String },
}
