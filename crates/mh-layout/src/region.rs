//! Where each role's values live in the host arrays.
//!
//! The host passes four flat arrays per call. Leading slots carry host data,
//! the remainder the model's declared fields in order:
//!
//! - parameters: `[id, host_step, stop_time, release_time, params...]`
//! - inputs: `[t, inputs...]` (at init also followed by initial outputs)
//! - outputs: `[outputs...]`

use mh_core::Role;

use crate::error::{LayoutError, LayoutResult};

/// First model parameter in the host parameter array.
pub const PARAMETER_REGION_START: usize = 4;
/// First model input in the host input array.
pub const INPUT_REGION_START: usize = 1;
/// First model output in the host output array.
pub const OUTPUT_REGION_START: usize = 0;

/// A role's slice of a host array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostRegion {
    pub role: Role,
    pub start: usize,
    pub len: usize,
}

impl HostRegion {
    /// Region for `count` declared fields of `role`.
    pub fn for_role(role: Role, count: usize) -> Self {
        let start = match role {
            Role::Parameters => PARAMETER_REGION_START,
            Role::Inputs => INPUT_REGION_START,
            Role::Outputs => OUTPUT_REGION_START,
        };
        Self {
            role,
            start,
            len: count,
        }
    }

    /// Region directly following this one, e.g. the initial outputs that
    /// trail the inputs in the host input array at init.
    pub fn followed_by(self, role: Role, count: usize) -> Self {
        Self {
            role,
            start: self.end(),
            len: count,
        }
    }

    pub fn end(self) -> usize {
        self.start + self.len
    }

    /// The host array must reach at least to the end of the region.
    pub fn check_fits(self, available: usize) -> LayoutResult<()> {
        if self.end() > available {
            return Err(LayoutError::RegionTooShort {
                role: self.role,
                start: self.start,
                needed: self.len,
                available,
            });
        }
        Ok(())
    }

    /// The host array must end exactly at the end of the region.
    pub fn check_exact(self, available: usize) -> LayoutResult<()> {
        self.check_fits(available)?;
        if available != self.end() {
            return Err(LayoutError::RegionMismatch {
                role: self.role,
                expected: self.len,
                got: available.saturating_sub(self.start),
            });
        }
        Ok(())
    }

    pub fn slice(self, host: &[f64]) -> LayoutResult<&[f64]> {
        self.check_fits(host.len())?;
        Ok(&host[self.start..self.end()])
    }
}
