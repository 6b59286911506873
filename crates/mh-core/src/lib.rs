//! mh-core: shared vocabulary for the component-model host.
//!
//! Contains:
//! - ids (arena slot identifiers)
//! - numeric (Real and finiteness checks)
//! - datatype (native field type tags of the component-model ABI)
//! - field (field descriptors and buffer roles)
//! - status (lifecycle return codes)
//! - verbosity (host log levels)
//! - error (shared error types)

pub mod datatype;
pub mod error;
pub mod field;
pub mod ids;
pub mod numeric;
pub mod status;
pub mod verbosity;

// Re-exports: nice ergonomics for downstream crates
pub use datatype::DataType;
pub use error::{CoreError, CoreResult};
pub use field::{FieldDescriptor, Role};
pub use ids::*;
pub use numeric::*;
pub use status::ReturnCode;
pub use verbosity::Verbosity;
