//! Owned copy of a model's self-description.
//!
//! `Model_GetInfo` returns a pointer into the library's static data. It is
//! copied once, at bind time, into [`ModelMetadata`] so nothing downstream
//! dereferences library memory.

use core::ffi::{CStr, c_char};
use core::fmt;
use std::path::Path;

use mh_core::{DataType, FieldDescriptor, ensure_positive};
use mh_layout::StateCounts;
use serde::Serialize;

use crate::error::{BindError, BindResult};
use crate::ffi::{RawModelInfo, RawParameter, RawSignal, RawValue};

/// One input or output port.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalInfo {
    pub field: FieldDescriptor,
    pub description: String,
    pub unit: String,
}

impl SignalInfo {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            field: FieldDescriptor::new(name, data_type),
            description: String::new(),
            unit: String::new(),
        }
    }
}

/// One parameter, with its declared bounds when the type is numeric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterInfo {
    pub field: FieldDescriptor,
    pub group: String,
    pub description: String,
    pub unit: String,
    /// Parameter cannot change during a run.
    pub fixed: bool,
    pub default: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ParameterInfo {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            field: FieldDescriptor::new(name, data_type),
            group: String::new(),
            description: String::new(),
            unit: String::new(),
            fixed: false,
            default: None,
            min: None,
            max: None,
        }
    }
}

/// Everything the host needs to know about a model before calling it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelMetadata {
    pub interface_version: [u8; 4],
    pub name: String,
    pub version: String,
    pub description: String,
    pub general_information: String,
    pub created: String,
    pub creator: String,
    pub last_modified_date: String,
    pub last_modified_by: String,
    pub modified_comment: String,
    pub modified_history: String,
    /// The model's own fixed time step (seconds).
    pub fixed_step: f64,
    pub emt_rms_mode: u8,
    pub inputs: Vec<SignalInfo>,
    pub outputs: Vec<SignalInfo>,
    pub parameters: Vec<ParameterInfo>,
    pub int_states: usize,
    pub float_states: usize,
    pub double_states: usize,
}

impl ModelMetadata {
    /// Minimal metadata, for models implemented in Rust.
    pub fn new(name: impl Into<String>, fixed_step: f64) -> Self {
        Self {
            interface_version: [1, 1, 0, 0],
            name: name.into(),
            version: String::new(),
            description: String::new(),
            general_information: String::new(),
            created: String::new(),
            creator: String::new(),
            last_modified_date: String::new(),
            last_modified_by: String::new(),
            modified_comment: String::new(),
            modified_history: String::new(),
            fixed_step,
            emt_rms_mode: 1,
            inputs: Vec::new(),
            outputs: Vec::new(),
            parameters: Vec::new(),
            int_states: 0,
            float_states: 0,
            double_states: 0,
        }
    }

    pub fn with_input(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.inputs.push(SignalInfo::new(name, data_type));
        self
    }

    pub fn with_output(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.outputs.push(SignalInfo::new(name, data_type));
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.parameters.push(ParameterInfo::new(name, data_type));
        self
    }

    pub fn with_states(mut self, int: usize, float: usize, double: usize) -> Self {
        self.int_states = int;
        self.float_states = float;
        self.double_states = double;
        self
    }

    pub fn input_fields(&self) -> Vec<FieldDescriptor> {
        self.inputs.iter().map(|s| s.field.clone()).collect()
    }

    pub fn output_fields(&self) -> Vec<FieldDescriptor> {
        self.outputs.iter().map(|s| s.field.clone()).collect()
    }

    pub fn parameter_fields(&self) -> Vec<FieldDescriptor> {
        self.parameters.iter().map(|p| p.field.clone()).collect()
    }

    pub fn state_counts(&self) -> StateCounts {
        StateCounts::new(self.int_states, self.float_states, self.double_states)
    }

    /// Check the values the host depends on.
    pub fn validate(&self, path: &Path) -> BindResult<()> {
        ensure_positive(self.fixed_step, "fixed step").map_err(|e| BindError::InvalidMetadata {
            path: path.to_path_buf(),
            what: format!("{e} (FixedStepBaseSampleTime = {})", self.fixed_step),
        })?;
        Ok(())
    }

    /// Copy a native model description.
    ///
    /// # Safety
    ///
    /// `info` must be null or point to a valid `RawModelInfo` whose string
    /// and array pointers are null or valid for the declared counts.
    pub unsafe fn from_raw(info: *const RawModelInfo, path: &Path) -> BindResult<Self> {
        let invalid = |what: String| BindError::InvalidMetadata {
            path: path.to_path_buf(),
            what,
        };
        // SAFETY: caller guarantees `info` is null or valid.
        let info = unsafe { info.as_ref() }.ok_or_else(|| invalid("Model_GetInfo returned null".into()))?;

        let count = |value: i32, what: &str| {
            usize::try_from(value).map_err(|_| invalid(format!("negative {what} ({value})")))
        };
        let num_inputs = count(info.num_input_ports, "input count")?;
        let num_outputs = count(info.num_output_ports, "output count")?;
        let num_parameters = count(info.num_parameters, "parameter count")?;

        // SAFETY: counts and pointers come from the same valid info struct.
        let inputs = unsafe { raw_slice(info.input_ports_info, num_inputs) }
            .ok_or_else(|| invalid("null input port table".into()))?;
        let outputs = unsafe { raw_slice(info.output_ports_info, num_outputs) }
            .ok_or_else(|| invalid("null output port table".into()))?;
        let parameters = unsafe { raw_slice(info.parameters_info, num_parameters) }
            .ok_or_else(|| invalid("null parameter table".into()))?;

        let signal = |raw: &RawSignal| -> BindResult<SignalInfo> {
            // SAFETY: strings in a valid info struct are null or NUL-terminated.
            let name = unsafe { c_string(raw.name) };
            if raw.width > 1 {
                return Err(invalid(format!(
                    "port '{name}' has width {}; only scalar ports are supported",
                    raw.width
                )));
            }
            Ok(SignalInfo {
                field: FieldDescriptor::with_tag(name, raw.data_type),
                description: unsafe { c_string(raw.description) },
                unit: unsafe { c_string(raw.unit) },
            })
        };

        let metadata = ModelMetadata {
            interface_version: info.dll_interface_version,
            // SAFETY: as above for every string field.
            name: unsafe { c_string(info.model_name) },
            version: unsafe { c_string(info.model_version) },
            description: unsafe { c_string(info.model_description) },
            general_information: unsafe { c_string(info.general_information) },
            created: unsafe { c_string(info.model_created) },
            creator: unsafe { c_string(info.model_creator) },
            last_modified_date: unsafe { c_string(info.model_last_modified_date) },
            last_modified_by: unsafe { c_string(info.model_last_modified_by) },
            modified_comment: unsafe { c_string(info.model_modified_comment) },
            modified_history: unsafe { c_string(info.model_modified_history) },
            fixed_step: info.fixed_step_base_sample_time,
            emt_rms_mode: info.emt_rms_mode,
            inputs: inputs.iter().map(&signal).collect::<BindResult<_>>()?,
            outputs: outputs.iter().map(&signal).collect::<BindResult<_>>()?,
            parameters: parameters.iter().map(|p| unsafe { parameter(p) }).collect(),
            int_states: count(info.num_int_states, "integer state count")?,
            float_states: count(info.num_float_states, "float state count")?,
            double_states: count(info.num_double_states, "double state count")?,
        };
        metadata.validate(path)?;
        Ok(metadata)
    }
}

/// # Safety
///
/// `ptr` must be null or valid for `len` reads.
unsafe fn raw_slice<'a, T>(ptr: *const T, len: usize) -> Option<&'a [T]> {
    if len == 0 {
        return Some(&[]);
    }
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null and valid for `len` elements per the caller.
    Some(unsafe { core::slice::from_raw_parts(ptr, len) })
}

/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
pub(crate) unsafe fn c_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: non-null and NUL-terminated per the caller.
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// Read a default/min/max union according to the parameter's type.
///
/// # Safety
///
/// The union must hold the member selected by `data_type`.
unsafe fn raw_value(data_type: Option<DataType>, value: &RawValue) -> Option<f64> {
    // SAFETY: the active member is the one matching the declared type.
    unsafe {
        Some(match data_type? {
            DataType::Char8 => f64::from(value.char_val as i8),
            DataType::Int8 => f64::from(value.int8_val),
            DataType::Uint8 => f64::from(value.uint8_val),
            DataType::Int16 => f64::from(value.int16_val),
            DataType::Uint16 => f64::from(value.uint16_val),
            DataType::Int32 => f64::from(value.int32_val),
            DataType::Uint32 => f64::from(value.uint32_val),
            DataType::Float32 => f64::from(value.real32_val),
            DataType::Float64 => value.real64_val,
        })
    }
}

/// # Safety
///
/// Strings must be null or NUL-terminated; value unions must match the type.
unsafe fn parameter(raw: &RawParameter) -> ParameterInfo {
    let data_type = DataType::from_tag(raw.data_type).ok();
    // SAFETY: forwarded from the caller.
    unsafe {
        ParameterInfo {
            field: FieldDescriptor::with_tag(c_string(raw.name), raw.data_type),
            group: c_string(raw.group_name),
            description: c_string(raw.description),
            unit: c_string(raw.unit),
            fixed: raw.fixed_value != 0,
            default: raw_value(data_type, &raw.default_value),
            min: raw_value(data_type, &raw.min_value),
            max: raw_value(data_type, &raw.max_value),
        }
    }
}

fn write_fields(f: &mut fmt::Formatter<'_>, label: &str, fields: &[&FieldDescriptor]) -> fmt::Result {
    writeln!(f, "{label} ({}):", fields.len())?;
    for (i, field) in fields.iter().enumerate() {
        writeln!(f, "  [{i}] {field}")?;
    }
    Ok(())
}

impl fmt::Display for ModelMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.interface_version;
        writeln!(f, "Model Name= {}", self.name)?;
        if !self.version.is_empty() {
            writeln!(f, "Model Version= {}", self.version)?;
        }
        if !self.description.is_empty() {
            writeln!(f, "Description= {}", self.description)?;
        }
        writeln!(f, "Interface Version= {a}.{b}.{c}.{d}")?;
        writeln!(f, "Fixed Step= {}", self.fixed_step)?;
        write_fields(f, "Inputs", &self.inputs.iter().map(|s| &s.field).collect::<Vec<_>>())?;
        write_fields(f, "Outputs", &self.outputs.iter().map(|s| &s.field).collect::<Vec<_>>())?;
        write_fields(
            f,
            "Parameters",
            &self.parameters.iter().map(|p| &p.field).collect::<Vec<_>>(),
        )?;
        write!(
            f,
            "States: {} int, {} float, {} double",
            self.int_states, self.float_states, self.double_states
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::ptr;

    fn signal(name: &'static CStr, data_type: DataType) -> RawSignal {
        RawSignal {
            name: name.as_ptr(),
            description: ptr::null(),
            unit: c"pu".as_ptr(),
            data_type: data_type.tag(),
            width: 1,
        }
    }

    fn info(inputs: &[RawSignal], outputs: &[RawSignal], params: &[RawParameter]) -> RawModelInfo {
        RawModelInfo {
            dll_interface_version: [1, 1, 0, 0],
            model_name: c"SCRX9".as_ptr(),
            model_version: c"1.0.0".as_ptr(),
            model_description: ptr::null(),
            general_information: ptr::null(),
            model_created: ptr::null(),
            model_creator: ptr::null(),
            model_last_modified_date: ptr::null(),
            model_last_modified_by: ptr::null(),
            model_modified_comment: ptr::null(),
            model_modified_history: ptr::null(),
            fixed_step_base_sample_time: 0.005,
            emt_rms_mode: 1,
            num_input_ports: inputs.len() as i32,
            input_ports_info: inputs.as_ptr(),
            num_output_ports: outputs.len() as i32,
            output_ports_info: outputs.as_ptr(),
            num_parameters: params.len() as i32,
            parameters_info: params.as_ptr(),
            num_int_states: 0,
            num_float_states: 0,
            num_double_states: 5,
        }
    }

    #[test]
    fn raw_info_is_copied() {
        let inputs = [signal(c"VRef", DataType::Float64), signal(c"Ec", DataType::Float64)];
        let outputs = [signal(c"EFD", DataType::Float64)];
        let params = [RawParameter {
            name: c"CSwitch".as_ptr(),
            group_name: ptr::null(),
            description: c"Power source".as_ptr(),
            unit: ptr::null(),
            data_type: DataType::Int32.tag(),
            fixed_value: 1,
            default_value: RawValue { int32_val: 1 },
            min_value: RawValue { int32_val: 0 },
            max_value: RawValue { int32_val: 1 },
        }];
        let raw = info(&inputs, &outputs, &params);

        let meta = unsafe { ModelMetadata::from_raw(&raw, Path::new("scrx.so")) }.unwrap();
        assert_eq!(meta.name, "SCRX9");
        assert_eq!(meta.fixed_step, 0.005);
        assert_eq!(meta.inputs.len(), 2);
        assert_eq!(meta.inputs[1].field.name, "Ec");
        assert_eq!(meta.inputs[0].unit, "pu");
        assert_eq!(meta.outputs[0].field, FieldDescriptor::new("EFD", DataType::Float64));
        assert_eq!(meta.parameters[0].default, Some(1.0));
        assert_eq!(meta.parameters[0].max, Some(1.0));
        assert!(meta.parameters[0].fixed);
        assert_eq!(meta.state_counts(), StateCounts::new(0, 0, 5));
    }

    #[test]
    fn null_info_is_rejected() {
        let err = unsafe { ModelMetadata::from_raw(ptr::null(), Path::new("x.so")) }.unwrap_err();
        assert!(matches!(err, BindError::InvalidMetadata { .. }));
    }

    #[test]
    fn null_table_with_nonzero_count_is_rejected() {
        let mut raw = info(&[], &[], &[]);
        raw.num_input_ports = 2;
        raw.input_ports_info = ptr::null();
        let err = unsafe { ModelMetadata::from_raw(&raw, Path::new("x.so")) }.unwrap_err();
        assert!(err.to_string().contains("input port table"));
    }

    #[test]
    fn vector_ports_are_rejected() {
        let mut wide = signal(c"V", DataType::Float64);
        wide.width = 3;
        let inputs = [wide];
        let raw = info(&inputs, &[], &[]);
        let err = unsafe { ModelMetadata::from_raw(&raw, Path::new("x.so")) }.unwrap_err();
        assert!(err.to_string().contains("width 3"));
    }

    #[test]
    fn non_positive_step_is_rejected() {
        let meta = ModelMetadata::new("m", 0.0);
        assert!(meta.validate(Path::new("m.so")).is_err());
        assert!(ModelMetadata::new("m", 1e-3).validate(Path::new("m.so")).is_ok());
    }

    #[test]
    fn builder_and_dump() {
        let meta = ModelMetadata::new("modelA", 0.01)
            .with_input("in1", DataType::Float64)
            .with_output("out1", DataType::Int32)
            .with_parameter("k", DataType::Float32)
            .with_states(0, 0, 5);
        let text = meta.to_string();
        assert!(text.contains("Model Name= modelA"));
        assert!(text.contains("[0] out1: int32_T"));
        assert!(text.ends_with("States: 0 int, 0 float, 5 double"));

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["name"], "modelA");
        assert_eq!(json["inputs"][0]["field"]["tag"], 9);
    }
}
