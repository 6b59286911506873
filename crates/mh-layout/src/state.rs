//! Typed views into the host-owned state array.
//!
//! The host reserves one `f64` array per instance for the model's internal
//! states. The model asks for a number of `int32`, `real32` and `real64`
//! states; they are packed into that array in this order:
//!
//! - integer states from byte 0, 4 bytes each
//! - float states right after, 4 bytes each
//! - double states from slot `int + float`, one slot each
//!
//! Doubles start on the slot boundary the host's pointer arithmetic lands on,
//! so the array needs `int + float + double` slots even though the small
//! states only use half a slot each.

use tracing::trace;

use crate::error::{LayoutError, LayoutResult};

const HALF: usize = 4;

/// Number of states of each kind a model requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateCounts {
    pub int: usize,
    pub float: usize,
    pub double: usize,
}

impl StateCounts {
    pub fn new(int: usize, float: usize, double: usize) -> Self {
        Self { int, float, double }
    }

    /// Host slots the views span.
    pub fn required_slots(&self) -> usize {
        self.int + self.float + self.double
    }

    pub fn is_empty(&self) -> bool {
        self.required_slots() == 0
    }

    /// Byte offset of the float view inside the host array.
    pub fn float_byte_offset(&self) -> usize {
        self.int * HALF
    }

    /// Slot index where the double view starts.
    pub fn double_slot_offset(&self) -> usize {
        self.int + self.float
    }
}

/// Borrowed view of one call's worth of host state memory.
///
/// Never outlives the host call that lent the array.
#[derive(Debug)]
pub struct StateMemory<'a> {
    counts: StateCounts,
    words: &'a mut [f64],
}

impl<'a> StateMemory<'a> {
    pub fn new(counts: StateCounts, words: &'a mut [f64]) -> LayoutResult<Self> {
        let needed = counts.required_slots();
        if words.len() < needed {
            return Err(LayoutError::StateMemoryTooSmall {
                needed,
                available: words.len(),
            });
        }
        trace!(?counts, slots = words.len(), "mapped state memory");
        Ok(Self { counts, words })
    }

    pub fn counts(&self) -> StateCounts {
        self.counts
    }

    /// Base of the host array, for handing to native code.
    pub fn as_mut_ptr(&mut self) -> *mut f64 {
        self.words.as_mut_ptr()
    }

    fn check(kind: &'static str, index: usize, len: usize) -> LayoutResult<()> {
        if index >= len {
            return Err(LayoutError::StateIndex { kind, index, len });
        }
        Ok(())
    }

    /// Slot and half-slot holding the 4-byte state at `byte_offset`.
    fn half_slot(byte_offset: usize) -> (usize, usize) {
        (byte_offset / 8, byte_offset % 8)
    }

    fn read_half(&self, byte_offset: usize) -> [u8; 4] {
        let (slot, at) = Self::half_slot(byte_offset);
        let bytes = self.words[slot].to_ne_bytes();
        [bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]
    }

    fn write_half(&mut self, byte_offset: usize, value: [u8; 4]) {
        let (slot, at) = Self::half_slot(byte_offset);
        let mut bytes = self.words[slot].to_ne_bytes();
        bytes[at..at + HALF].copy_from_slice(&value);
        self.words[slot] = f64::from_ne_bytes(bytes);
    }

    pub fn int(&self, index: usize) -> LayoutResult<i32> {
        Self::check("Integer", index, self.counts.int)?;
        Ok(i32::from_ne_bytes(self.read_half(index * HALF)))
    }

    pub fn set_int(&mut self, index: usize, value: i32) -> LayoutResult<()> {
        Self::check("Integer", index, self.counts.int)?;
        self.write_half(index * HALF, value.to_ne_bytes());
        Ok(())
    }

    pub fn float(&self, index: usize) -> LayoutResult<f32> {
        Self::check("Float", index, self.counts.float)?;
        let offset = self.counts.float_byte_offset() + index * HALF;
        Ok(f32::from_ne_bytes(self.read_half(offset)))
    }

    pub fn set_float(&mut self, index: usize, value: f32) -> LayoutResult<()> {
        Self::check("Float", index, self.counts.float)?;
        let offset = self.counts.float_byte_offset() + index * HALF;
        self.write_half(offset, value.to_ne_bytes());
        Ok(())
    }

    /// Double states, or `None` when the model requested none.
    pub fn doubles(&self) -> Option<&[f64]> {
        if self.counts.double == 0 {
            return None;
        }
        let start = self.counts.double_slot_offset();
        Some(&self.words[start..start + self.counts.double])
    }

    pub fn doubles_mut(&mut self) -> Option<&mut [f64]> {
        if self.counts.double == 0 {
            return None;
        }
        let start = self.counts.double_slot_offset();
        Some(&mut self.words[start..start + self.counts.double])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_small_array_is_rejected() {
        let mut words = [0.0; 4];
        let err = StateMemory::new(StateCounts::new(1, 1, 3), &mut words).unwrap_err();
        assert_eq!(
            err,
            LayoutError::StateMemoryTooSmall {
                needed: 5,
                available: 4
            }
        );
    }

    #[test]
    fn views_do_not_overlap() {
        let mut words = [0.0; 6];
        let mut mem = StateMemory::new(StateCounts::new(3, 2, 1), &mut words).unwrap();
        for i in 0..3 {
            mem.set_int(i, -(i as i32) - 1).unwrap();
        }
        mem.set_float(0, 1.5).unwrap();
        mem.set_float(1, -2.25).unwrap();
        mem.doubles_mut().unwrap()[0] = 99.0;

        assert_eq!(mem.int(0).unwrap(), -1);
        assert_eq!(mem.int(1).unwrap(), -2);
        assert_eq!(mem.int(2).unwrap(), -3);
        assert_eq!(mem.float(0).unwrap(), 1.5);
        assert_eq!(mem.float(1).unwrap(), -2.25);
        assert_eq!(mem.doubles().unwrap(), &[99.0]);
        assert_eq!(words[5], 99.0);
    }

    #[test]
    fn zero_count_yields_no_view() {
        let mut words = [0.0; 5];
        let mut mem = StateMemory::new(StateCounts::new(0, 0, 5), &mut words).unwrap();
        assert!(mem.int(0).is_err());
        assert!(mem.float(0).is_err());
        assert_eq!(mem.doubles_mut().unwrap().len(), 5);

        let mut words = [0.0; 2];
        let mem = StateMemory::new(StateCounts::new(2, 0, 0), &mut words).unwrap();
        assert!(mem.doubles().is_none());
    }

    #[test]
    fn double_view_starts_after_int_and_float_slots() {
        let counts = StateCounts::new(1, 2, 2);
        assert_eq!(counts.float_byte_offset(), 4);
        assert_eq!(counts.double_slot_offset(), 3);
        assert_eq!(counts.required_slots(), 5);
    }
}
