//! Field descriptors as declared by a component model.

use core::fmt;

use crate::{CoreResult, DataType};

/// Which of an instance's three packed buffers a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Role {
    Parameters,
    Inputs,
    Outputs,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Parameters => "Parameters",
            Role::Inputs => "Inputs",
            Role::Outputs => "Outputs",
        };
        f.write_str(label)
    }
}

/// A named field with the raw type tag the model declared.
///
/// The tag is kept undecoded: whether it names a marshalable type is decided
/// by the layout engine, which must fail loudly on an unknown tag.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDescriptor {
    pub name: String,
    pub tag: i32,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self::with_tag(name, data_type.tag())
    }

    pub fn with_tag(name: impl Into<String>, tag: i32) -> Self {
        Self {
            name: name.into(),
            tag,
        }
    }

    pub fn data_type(&self) -> CoreResult<DataType> {
        DataType::from_tag(self.tag)
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data_type() {
            Ok(ty) => write!(f, "{}: {}", self.name, ty),
            Err(_) => write!(f, "{}: <tag {}>", self.name, self.tag),
        }
    }
}
