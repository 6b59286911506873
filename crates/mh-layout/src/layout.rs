//! Natural-alignment struct layout.
//!
//! A field of size `S` starts at the next offset that is a multiple of `S`.
//! Every ABI type has alignment equal to its size, so this reproduces what a
//! C compiler emits for a struct with the fields in declaration order.

use mh_core::{DataType, FieldDescriptor};

use crate::error::{LayoutError, LayoutResult};

/// Placement of one field inside a packed buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSlot {
    pub name: String,
    pub data_type: DataType,
    pub offset: usize,
}

impl FieldSlot {
    /// Offset one past the last byte of this field.
    pub fn end(&self) -> usize {
        self.offset + self.data_type.size()
    }
}

/// Computed layout for an ordered field list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Layout {
    slots: Vec<FieldSlot>,
    total_size: usize,
}

impl Layout {
    pub fn slots(&self) -> &[FieldSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&FieldSlot> {
        self.slots.get(index)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Offset following the last field. Zero for an empty layout.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn offsets(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots.iter().map(|s| s.offset)
    }

    /// Largest field alignment; the size a native struct would be padded to.
    pub fn max_alignment(&self) -> usize {
        self.slots
            .iter()
            .map(|s| s.data_type.size())
            .max()
            .unwrap_or(1)
    }
}

/// Round `offset` up to the next multiple of `align`.
fn align_up(offset: usize, align: usize) -> usize {
    let remainder = offset % align;
    if remainder == 0 {
        offset
    } else {
        offset + (align - remainder)
    }
}

/// Compute offsets for `fields` in declaration order.
///
/// Fails on the first field whose tag has no native size.
pub fn compute_layout(fields: &[FieldDescriptor]) -> LayoutResult<Layout> {
    let mut slots = Vec::with_capacity(fields.len());
    let mut cursor = 0usize;

    for (index, field) in fields.iter().enumerate() {
        let data_type = field
            .data_type()
            .map_err(|_| LayoutError::UnknownFieldType {
                field: field.name.clone(),
                index,
                tag: field.tag,
            })?;
        let size = data_type.size();
        let offset = align_up(cursor, size);
        slots.push(FieldSlot {
            name: field.name.clone(),
            data_type,
            offset,
        });
        cursor = offset + size;
    }

    Ok(Layout {
        slots,
        total_size: cursor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(types: &[DataType]) -> Vec<FieldDescriptor> {
        types
            .iter()
            .enumerate()
            .map(|(i, ty)| FieldDescriptor::new(format!("f{i}"), *ty))
            .collect()
    }

    #[test]
    fn empty_layout_has_zero_size() {
        let layout = compute_layout(&[]).unwrap();
        assert!(layout.is_empty());
        assert_eq!(layout.total_size(), 0);
        assert_eq!(layout.max_alignment(), 1);
    }

    #[test]
    fn exciter_parameters_match_c_struct() {
        // 6 doubles, an int32 switch, then a trailing double.
        let mut types = vec![DataType::Float64; 6];
        types.push(DataType::Int32);
        types.push(DataType::Float64);
        let layout = compute_layout(&fields(&types)).unwrap();

        let offsets: Vec<usize> = layout.offsets().collect();
        assert_eq!(offsets, vec![0, 8, 16, 24, 32, 40, 48, 56]);
        assert_eq!(layout.total_size(), 64);
    }

    #[test]
    fn mixed_small_types_pad_to_alignment() {
        let layout = compute_layout(&fields(&[
            DataType::Uint8,
            DataType::Int16,
            DataType::Char8,
            DataType::Float32,
            DataType::Int8,
            DataType::Float64,
        ]))
        .unwrap();

        let offsets: Vec<usize> = layout.offsets().collect();
        assert_eq!(offsets, vec![0, 2, 4, 8, 12, 16]);
        assert_eq!(layout.total_size(), 24);
    }

    #[test]
    fn unknown_tag_names_the_field() {
        let list = vec![
            FieldDescriptor::new("ok", DataType::Float64),
            FieldDescriptor::with_tag("label", 10),
        ];
        let err = compute_layout(&list).unwrap_err();
        assert_eq!(
            err,
            LayoutError::UnknownFieldType {
                field: "label".to_string(),
                index: 1,
                tag: 10,
            }
        );
        assert!(err.to_string().contains("label"));
    }

    #[test]
    fn recomputation_is_idempotent() {
        let list = fields(&[DataType::Int16, DataType::Float64, DataType::Uint8]);
        assert_eq!(compute_layout(&list).unwrap(), compute_layout(&list).unwrap());
    }
}
