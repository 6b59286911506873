//! Native field types of the component-model ABI.
//!
//! Models declare each port and parameter with one of these tags. The tag
//! selects both the byte size (and therefore the natural alignment) of the
//! field inside a packed buffer and the conversion applied when values cross
//! the host's `f64` arrays.

use core::fmt;

use crate::{CoreError, CoreResult};

/// Native type of a single field.
///
/// Discriminants are the wire tags used by the ABI header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(i32)]
pub enum DataType {
    /// `char`, treated as a signed 8-bit integer.
    Char8 = 1,
    Int8 = 2,
    Uint8 = 3,
    Int16 = 4,
    Uint16 = 5,
    Int32 = 6,
    Uint32 = 7,
    Float32 = 8,
    Float64 = 9,
}

impl DataType {
    /// Every marshalable type, in tag order.
    pub const ALL: [DataType; 9] = [
        DataType::Char8,
        DataType::Int8,
        DataType::Uint8,
        DataType::Int16,
        DataType::Uint16,
        DataType::Int32,
        DataType::Uint32,
        DataType::Float32,
        DataType::Float64,
    ];

    /// Decode a wire tag.
    ///
    /// Tag 10 (`c_string`) exists in the ABI but has no fixed size, so it is
    /// rejected like any other unknown tag.
    pub fn from_tag(tag: i32) -> CoreResult<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.tag() == tag)
            .ok_or(CoreError::UnknownDataType { tag })
    }

    /// Wire tag of this type.
    pub fn tag(self) -> i32 {
        self as i32
    }

    /// Size in bytes; also the natural alignment.
    pub fn size(self) -> usize {
        match self {
            DataType::Char8 | DataType::Int8 | DataType::Uint8 => 1,
            DataType::Int16 | DataType::Uint16 => 2,
            DataType::Int32 | DataType::Uint32 | DataType::Float32 => 4,
            DataType::Float64 => 8,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    /// Name as spelled in the ABI header.
    pub fn c_name(self) -> &'static str {
        match self {
            DataType::Char8 => "char_T",
            DataType::Int8 => "int8_T",
            DataType::Uint8 => "uint8_T",
            DataType::Int16 => "int16_T",
            DataType::Uint16 => "uint16_T",
            DataType::Int32 => "int32_T",
            DataType::Uint32 => "uint32_T",
            DataType::Float32 => "real32_T",
            DataType::Float64 => "real64_T",
        }
    }
}

impl TryFrom<i32> for DataType {
    type Error = CoreError;

    fn try_from(tag: i32) -> Result<Self, Self::Error> {
        Self::from_tag(tag)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.c_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for ty in DataType::ALL {
            assert_eq!(DataType::from_tag(ty.tag()), Ok(ty));
        }
    }

    #[test]
    fn string_and_unknown_tags_rejected() {
        for tag in [0, 10, -1, 99] {
            assert_eq!(
                DataType::from_tag(tag),
                Err(CoreError::UnknownDataType { tag })
            );
        }
    }

    #[test]
    fn sizes_match_native_types() {
        assert_eq!(DataType::Char8.size(), core::mem::size_of::<i8>());
        assert_eq!(DataType::Uint16.size(), core::mem::size_of::<u16>());
        assert_eq!(DataType::Int32.size(), core::mem::size_of::<i32>());
        assert_eq!(DataType::Float32.size(), core::mem::size_of::<f32>());
        assert_eq!(DataType::Float64.size(), core::mem::size_of::<f64>());
    }
}
