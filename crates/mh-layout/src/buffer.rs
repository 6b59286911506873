//! Packed, heterogeneously typed buffers.
//!
//! A [`PackedBuffer`] is the Rust owner of the memory a component model sees
//! as its `ExternalInputs`, `ExternalOutputs` or `Parameters` struct. Field
//! access is bounds-checked and dispatched on [`NativeValue`]; native models
//! receive a pointer to the same bytes.

use core::ffi::c_void;

use mh_core::{DataType, Role};

use crate::error::{LayoutError, LayoutResult};
use crate::layout::{FieldSlot, Layout};

/// A value in one of the ABI's native representations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeValue {
    Char8(i8),
    Int8(i8),
    Uint8(u8),
    Int16(i16),
    Uint16(u16),
    Int32(i32),
    Uint32(u32),
    Float32(f32),
    Float64(f64),
}

impl NativeValue {
    /// Narrow a host value to `data_type`.
    ///
    /// Integers truncate toward zero; values outside the target range
    /// saturate and NaN becomes zero. Floats are cast directly.
    pub fn from_host(data_type: DataType, value: f64) -> Self {
        match data_type {
            DataType::Char8 => NativeValue::Char8(value as i8),
            DataType::Int8 => NativeValue::Int8(value as i8),
            DataType::Uint8 => NativeValue::Uint8(value as u8),
            DataType::Int16 => NativeValue::Int16(value as i16),
            DataType::Uint16 => NativeValue::Uint16(value as u16),
            DataType::Int32 => NativeValue::Int32(value as i32),
            DataType::Uint32 => NativeValue::Uint32(value as u32),
            DataType::Float32 => NativeValue::Float32(value as f32),
            DataType::Float64 => NativeValue::Float64(value),
        }
    }

    /// Widen to the host representation. Exact for every variant.
    pub fn to_host(self) -> f64 {
        match self {
            NativeValue::Char8(v) | NativeValue::Int8(v) => f64::from(v),
            NativeValue::Uint8(v) => f64::from(v),
            NativeValue::Int16(v) => f64::from(v),
            NativeValue::Uint16(v) => f64::from(v),
            NativeValue::Int32(v) => f64::from(v),
            NativeValue::Uint32(v) => f64::from(v),
            NativeValue::Float32(v) => f64::from(v),
            NativeValue::Float64(v) => v,
        }
    }

    pub fn data_type(self) -> DataType {
        match self {
            NativeValue::Char8(_) => DataType::Char8,
            NativeValue::Int8(_) => DataType::Int8,
            NativeValue::Uint8(_) => DataType::Uint8,
            NativeValue::Int16(_) => DataType::Int16,
            NativeValue::Uint16(_) => DataType::Uint16,
            NativeValue::Int32(_) => DataType::Int32,
            NativeValue::Uint32(_) => DataType::Uint32,
            NativeValue::Float32(_) => DataType::Float32,
            NativeValue::Float64(_) => DataType::Float64,
        }
    }

    fn encode(self, out: &mut [u8]) {
        match self {
            NativeValue::Char8(v) | NativeValue::Int8(v) => out.copy_from_slice(&v.to_ne_bytes()),
            NativeValue::Uint8(v) => out.copy_from_slice(&v.to_ne_bytes()),
            NativeValue::Int16(v) => out.copy_from_slice(&v.to_ne_bytes()),
            NativeValue::Uint16(v) => out.copy_from_slice(&v.to_ne_bytes()),
            NativeValue::Int32(v) => out.copy_from_slice(&v.to_ne_bytes()),
            NativeValue::Uint32(v) => out.copy_from_slice(&v.to_ne_bytes()),
            NativeValue::Float32(v) => out.copy_from_slice(&v.to_ne_bytes()),
            NativeValue::Float64(v) => out.copy_from_slice(&v.to_ne_bytes()),
        }
    }

    fn decode(data_type: DataType, bytes: &[u8]) -> Self {
        // Callers slice exactly `data_type.size()` bytes.
        let mut raw = [0u8; 8];
        raw[..bytes.len()].copy_from_slice(bytes);
        match data_type {
            DataType::Char8 => NativeValue::Char8(i8::from_ne_bytes([raw[0]])),
            DataType::Int8 => NativeValue::Int8(i8::from_ne_bytes([raw[0]])),
            DataType::Uint8 => NativeValue::Uint8(raw[0]),
            DataType::Int16 => NativeValue::Int16(i16::from_ne_bytes([raw[0], raw[1]])),
            DataType::Uint16 => NativeValue::Uint16(u16::from_ne_bytes([raw[0], raw[1]])),
            DataType::Int32 => {
                NativeValue::Int32(i32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]))
            }
            DataType::Uint32 => {
                NativeValue::Uint32(u32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]))
            }
            DataType::Float32 => {
                NativeValue::Float32(f32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]))
            }
            DataType::Float64 => NativeValue::Float64(f64::from_ne_bytes(raw)),
        }
    }
}

/// Owned storage for one role's native struct.
///
/// Backed by `u64` words so the base address satisfies the alignment of
/// every ABI type; the struct's trailing padding falls inside the last word.
#[derive(Debug, Clone)]
pub struct PackedBuffer {
    role: Role,
    layout: Layout,
    words: Vec<u64>,
}

impl PackedBuffer {
    /// Allocate a zeroed buffer for `layout`.
    pub fn new(role: Role, layout: Layout) -> Self {
        let words = vec![0u64; layout.total_size().div_ceil(8)];
        Self {
            role,
            layout,
            words,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Number of fields.
    pub fn field_count(&self) -> usize {
        self.layout.len()
    }

    /// Size in bytes of the packed struct.
    pub fn byte_len(&self) -> usize {
        self.layout.total_size()
    }

    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: the words are initialized, `u8` has no alignment or validity
        // requirements, and `byte_len() <= words.len() * 8`.
        unsafe { core::slice::from_raw_parts(self.words.as_ptr().cast::<u8>(), self.byte_len()) }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let len = self.byte_len();
        // SAFETY: as in `as_bytes`; the exclusive borrow of `self` covers the words.
        unsafe { core::slice::from_raw_parts_mut(self.words.as_mut_ptr().cast::<u8>(), len) }
    }

    /// Base address handed to native code. Stable for the buffer's lifetime.
    pub fn as_mut_ptr(&mut self) -> *mut c_void {
        self.words.as_mut_ptr().cast()
    }

    fn slot(&self, index: usize) -> LayoutResult<&FieldSlot> {
        self.layout.slot(index).ok_or(LayoutError::FieldIndex {
            role: self.role,
            index,
            len: self.layout.len(),
        })
    }

    fn checked_range(&self, slot: &FieldSlot) -> LayoutResult<core::ops::Range<usize>> {
        let len = self.byte_len();
        if slot.end() > len {
            return Err(LayoutError::OutOfBounds {
                offset: slot.offset,
                size: slot.data_type.size(),
                len,
            });
        }
        Ok(slot.offset..slot.end())
    }

    /// Read field `index` in its native representation.
    pub fn read(&self, index: usize) -> LayoutResult<NativeValue> {
        let slot = self.slot(index)?;
        let range = self.checked_range(slot)?;
        Ok(NativeValue::decode(slot.data_type, &self.as_bytes()[range]))
    }

    /// Store `value` in field `index`; the value's type must match the field.
    pub fn write(&mut self, index: usize, value: NativeValue) -> LayoutResult<()> {
        let slot = self.slot(index)?;
        if slot.data_type != value.data_type() {
            return Err(LayoutError::TypeMismatch {
                field: slot.name.clone(),
                expected: slot.data_type.c_name(),
                got: value.data_type().c_name(),
            });
        }
        let range = self.checked_range(slot)?;
        value.encode(&mut self.as_bytes_mut()[range]);
        Ok(())
    }

    /// Read field `index` widened to `f64`.
    pub fn get(&self, index: usize) -> LayoutResult<f64> {
        self.read(index).map(NativeValue::to_host)
    }

    /// Narrow `value` to field `index`'s type and store it.
    pub fn set(&mut self, index: usize, value: f64) -> LayoutResult<()> {
        let data_type = self.slot(index)?.data_type;
        self.write(index, NativeValue::from_host(data_type, value))
    }

    /// All fields widened to `f64`, in declaration order.
    pub fn to_host_values(&self) -> LayoutResult<Vec<f64>> {
        (0..self.field_count()).map(|i| self.get(i)).collect()
    }

    /// Index of the field called `name`, if any.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.layout.slots().iter().position(|s| s.name == name)
    }

    /// Zero every byte.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::compute_layout;
    use mh_core::FieldDescriptor;

    fn buffer(types: &[DataType]) -> PackedBuffer {
        let fields: Vec<FieldDescriptor> = types
            .iter()
            .enumerate()
            .map(|(i, ty)| FieldDescriptor::new(format!("f{i}"), *ty))
            .collect();
        PackedBuffer::new(Role::Inputs, compute_layout(&fields).unwrap())
    }

    #[test]
    fn base_address_is_word_aligned() {
        let mut buf = buffer(&[DataType::Uint8, DataType::Float64]);
        assert_eq!(buf.as_mut_ptr() as usize % 8, 0);
        assert_eq!(buf.byte_len(), 16);
    }

    #[test]
    fn write_lands_at_computed_offset() {
        let mut buf = buffer(&[DataType::Uint8, DataType::Int32]);
        buf.write(1, NativeValue::Int32(-2)).unwrap();
        assert_eq!(&buf.as_bytes()[4..8], &(-2i32).to_ne_bytes());
        assert_eq!(buf.as_bytes()[0], 0);
    }

    #[test]
    fn write_rejects_wrong_type() {
        let mut buf = buffer(&[DataType::Int16]);
        let err = buf.write(0, NativeValue::Float64(1.0)).unwrap_err();
        assert!(matches!(err, LayoutError::TypeMismatch { .. }));
    }

    #[test]
    fn index_past_end_is_reported() {
        let buf = buffer(&[DataType::Int16]);
        assert_eq!(
            buf.read(3),
            Err(LayoutError::FieldIndex {
                role: Role::Inputs,
                index: 3,
                len: 1
            })
        );
    }

    #[test]
    fn narrowing_truncates_toward_zero() {
        assert_eq!(
            NativeValue::from_host(DataType::Int32, -2.9),
            NativeValue::Int32(-2)
        );
        assert_eq!(
            NativeValue::from_host(DataType::Uint16, 7.99),
            NativeValue::Uint16(7)
        );
        assert_eq!(
            NativeValue::from_host(DataType::Int8, 1000.0),
            NativeValue::Int8(i8::MAX)
        );
    }

    #[test]
    fn set_and_get_by_name() {
        let mut buf = buffer(&[DataType::Float64, DataType::Int32]);
        let index = buf.position("f1").unwrap();
        buf.set(index, 3.7).unwrap();
        assert_eq!(buf.get(index).unwrap(), 3.0);
        buf.clear();
        assert_eq!(buf.to_host_values().unwrap(), vec![0.0, 0.0]);
    }
}
