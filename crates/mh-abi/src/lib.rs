//! The component-model ABI and the library binder.
//!
//! A component model is a shared library exporting a fixed set of C entry
//! points. This crate describes that ABI (`ffi`), turns the model's
//! self-description into owned Rust data (`metadata`), and binds libraries
//! into objects implementing [`ComponentModel`] (`binder`).
//!
//! # Architecture
//!
//! - [`ComponentModel`] is the seam the lifecycle controller drives. Native
//!   libraries implement it through [`NativeModel`]; tests and embedders can
//!   implement it directly in Rust.
//! - [`ModelLoader`] turns a manifest path into a bound model.
//! - Entry points are resolved once into a capability table; optional ones
//!   carry an explicit present/absent tag.

pub mod binder;
pub mod entry;
pub mod error;
pub mod ffi;
pub mod metadata;
pub mod model;

pub use binder::{BoundLibrary, EntryPoints, NativeLoader, NativeModel, check_exports};
pub use entry::{Capabilities, EntryPoint, LifecycleCall};
pub use error::{BindError, BindResult};
pub use metadata::{ModelMetadata, ParameterInfo, SignalInfo};
pub use model::{CallReply, ComponentModel, ModelContext, ModelLoader};
