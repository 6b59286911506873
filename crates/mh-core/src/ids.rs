use core::fmt;
use core::num::NonZeroU32;

/// Identifier of an arena slot, as written in the manifest and in the
/// leading slot of the host parameter array.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<InstanceId>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(NonZeroU32);

impl InstanceId {
    /// Create an id from a 0-based slot index by storing index+1.
    ///
    /// Returns `None` for `u32::MAX`, the only index without a successor.
    pub fn from_index(index: u32) -> Option<Self> {
        index.checked_add(1).and_then(NonZeroU32::new).map(Self)
    }

    /// Decode an id carried in a host `f64` slot.
    ///
    /// The host stores integers in floating point; the value must be a
    /// finite, non-negative whole number.
    pub fn from_host_value(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
            return None;
        }
        Self::from_index(value as u32)
    }

    /// Recover the 0-based slot index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }

    /// Slot index as `usize`, for table lookups.
    pub fn slot(self) -> usize {
        self.index() as usize
    }
}

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceId({})", self.index())
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn whole_host_values_map_to_their_index(index in 0_u32..1_000_000) {
            let id = InstanceId::from_host_value(f64::from(index)).unwrap();
            prop_assert_eq!(id.index(), index);
        }

        #[test]
        fn fractional_host_values_are_rejected(index in 0_u32..1_000_000, frac in 0.001_f64..0.999) {
            prop_assert!(InstanceId::from_host_value(f64::from(index) + frac).is_none());
        }
    }
}
