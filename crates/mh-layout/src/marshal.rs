//! Scatter host values into packed buffers and gather them back.
//!
//! Both directions check the host region before touching anything, so a
//! failure leaves the destination unchanged.

use crate::buffer::{NativeValue, PackedBuffer};
use crate::error::{LayoutError, LayoutResult};

fn check_region(buffer: &PackedBuffer, start: usize, available: usize) -> LayoutResult<()> {
    let needed = buffer.field_count();
    if start.checked_add(needed).is_none_or(|end| end > available) {
        return Err(LayoutError::RegionTooShort {
            role: buffer.role(),
            start,
            needed,
            available,
        });
    }
    Ok(())
}

/// Convert `host[start..start + n]` into `buffer`'s native fields.
pub fn scatter(host: &[f64], start: usize, buffer: &mut PackedBuffer) -> LayoutResult<()> {
    check_region(buffer, start, host.len())?;
    let values = &host[start..start + buffer.field_count()];

    // Narrow every value before storing any: the slots come from the
    // buffer's own layout, so the writes below cannot fail part way.
    let narrowed: Vec<NativeValue> = buffer
        .layout()
        .slots()
        .iter()
        .zip(values)
        .map(|(slot, &v)| NativeValue::from_host(slot.data_type, v))
        .collect();
    for (index, value) in narrowed.into_iter().enumerate() {
        buffer.write(index, value)?;
    }
    Ok(())
}

/// Widen `buffer`'s fields into `host[start..start + n]`.
pub fn gather(buffer: &PackedBuffer, host: &mut [f64], start: usize) -> LayoutResult<()> {
    check_region(buffer, start, host.len())?;
    let widened = buffer.to_host_values()?;
    host[start..start + widened.len()].copy_from_slice(&widened);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::compute_layout;
    use mh_core::{DataType, FieldDescriptor, Role};

    fn buffer(role: Role, types: &[DataType]) -> PackedBuffer {
        let fields: Vec<FieldDescriptor> = types
            .iter()
            .enumerate()
            .map(|(i, ty)| FieldDescriptor::new(format!("f{i}"), *ty))
            .collect();
        PackedBuffer::new(role, compute_layout(&fields).unwrap())
    }

    #[test]
    fn scatter_skips_leading_slots() {
        let mut buf = buffer(Role::Parameters, &[DataType::Float64, DataType::Int32]);
        let host = [0.0, 0.005, 10.0, 0.0, 2.5, 3.9];
        scatter(&host, 4, &mut buf).unwrap();
        assert_eq!(buf.read(0).unwrap(), NativeValue::Float64(2.5));
        assert_eq!(buf.read(1).unwrap(), NativeValue::Int32(3));
    }

    #[test]
    fn short_region_leaves_buffer_untouched() {
        let mut buf = buffer(Role::Inputs, &[DataType::Float64, DataType::Float64]);
        buf.set(0, 9.0).unwrap();
        let err = scatter(&[0.0, 1.0], 1, &mut buf).unwrap_err();
        assert_eq!(
            err,
            LayoutError::RegionTooShort {
                role: Role::Inputs,
                start: 1,
                needed: 2,
                available: 2
            }
        );
        assert_eq!(buf.get(0).unwrap(), 9.0);
    }

    #[test]
    fn gather_writes_only_its_region() {
        let mut buf = buffer(Role::Outputs, &[DataType::Uint8, DataType::Float32]);
        buf.set(0, 200.0).unwrap();
        buf.set(1, 0.5).unwrap();
        let mut host = [-1.0; 4];
        gather(&buf, &mut host, 1).unwrap();
        assert_eq!(host, [-1.0, 200.0, 0.5, -1.0]);
    }

    #[test]
    fn gather_into_short_array_fails() {
        let buf = buffer(Role::Outputs, &[DataType::Float64]);
        let mut host: [f64; 0] = [];
        assert!(gather(&buf, &mut host, 0).is_err());
    }

    #[test]
    fn empty_layout_accepts_empty_region() {
        let mut buf = buffer(Role::Outputs, &[]);
        scatter(&[], 0, &mut buf).unwrap();
        let mut host: [f64; 0] = [];
        gather(&buf, &mut host, 0).unwrap();
    }
}
