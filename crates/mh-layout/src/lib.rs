//! Native struct layout and marshaling between host arrays and packed buffers.
//!
//! The host engine only speaks flat `f64` arrays. Component models expect
//! their parameters, inputs and outputs as native structs. This crate:
//!
//! - computes the byte layout a C compiler would give a struct of the
//!   declared fields ([`compute_layout`])
//! - owns the aligned byte storage for one such struct ([`PackedBuffer`])
//! - converts between the host array and a buffer ([`scatter`], [`gather`])
//! - names the host-array regions each role occupies ([`HostRegion`])
//! - maps the host-owned state array into typed views ([`StateMemory`])

pub mod buffer;
pub mod error;
pub mod layout;
pub mod marshal;
pub mod region;
pub mod state;

pub use buffer::{NativeValue, PackedBuffer};
pub use error::{LayoutError, LayoutResult};
pub use layout::{FieldSlot, Layout, compute_layout};
pub use marshal::{gather, scatter};
pub use region::{HostRegion, INPUT_REGION_START, OUTPUT_REGION_START, PARAMETER_REGION_START};
pub use state::{StateCounts, StateMemory};
