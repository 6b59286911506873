//! `repr(C)` mirror of the component-model ABI header.
//!
//! Field order and types follow the header exactly; these structs are only
//! ever read from or handed to native code.

use core::ffi::{c_char, c_int, c_void};

/// Port description (`IEEE_Cigre_DLLInterface_Signal`).
#[repr(C)]
#[derive(Debug)]
pub struct RawSignal {
    pub name: *const c_char,
    pub description: *const c_char,
    pub unit: *const c_char,
    pub data_type: c_int,
    pub width: i32,
}

/// Default/min/max value, interpreted according to the parameter's type.
#[repr(C)]
#[derive(Clone, Copy)]
pub union RawValue {
    pub char_val: c_char,
    pub char_ptr: *const c_char,
    pub int8_val: i8,
    pub uint8_val: u8,
    pub int16_val: i16,
    pub uint16_val: u16,
    pub int32_val: i32,
    pub uint32_val: u32,
    pub real32_val: f32,
    pub real64_val: f64,
}

/// Parameter description (`IEEE_Cigre_DLLInterface_Parameter`).
#[repr(C)]
pub struct RawParameter {
    pub name: *const c_char,
    pub group_name: *const c_char,
    pub description: *const c_char,
    pub unit: *const c_char,
    pub data_type: c_int,
    pub fixed_value: i32,
    pub default_value: RawValue,
    pub min_value: RawValue,
    pub max_value: RawValue,
}

/// Model self-description (`IEEE_Cigre_DLLInterface_Model_Info`).
#[repr(C)]
pub struct RawModelInfo {
    pub dll_interface_version: [u8; 4],
    pub model_name: *const c_char,
    pub model_version: *const c_char,
    pub model_description: *const c_char,
    pub general_information: *const c_char,
    pub model_created: *const c_char,
    pub model_creator: *const c_char,
    pub model_last_modified_date: *const c_char,
    pub model_last_modified_by: *const c_char,
    pub model_modified_comment: *const c_char,
    pub model_modified_history: *const c_char,
    pub fixed_step_base_sample_time: f64,
    pub emt_rms_mode: u8,
    pub num_input_ports: i32,
    pub input_ports_info: *const RawSignal,
    pub num_output_ports: i32,
    pub output_ports_info: *const RawSignal,
    pub num_parameters: i32,
    pub parameters_info: *const RawParameter,
    pub num_int_states: i32,
    pub num_float_states: i32,
    pub num_double_states: i32,
}

/// Per-instance context passed to every lifecycle call
/// (`IEEE_Cigre_DLLInterface_Instance`).
#[repr(C)]
#[derive(Debug)]
pub struct RawInstance {
    pub external_inputs: *mut c_void,
    pub external_outputs: *mut c_void,
    pub parameters: *mut c_void,
    pub time: f64,
    pub sim_tool_emt_rms_mode: u8,
    pub last_error_message: *const c_char,
    pub last_general_message: *const c_char,
    pub int_states: *mut i32,
    pub float_states: *mut f32,
    pub double_states: *mut f64,
}

impl Default for RawInstance {
    fn default() -> Self {
        Self {
            external_inputs: core::ptr::null_mut(),
            external_outputs: core::ptr::null_mut(),
            parameters: core::ptr::null_mut(),
            time: 0.0,
            sim_tool_emt_rms_mode: 0,
            last_error_message: core::ptr::null(),
            last_general_message: core::ptr::null(),
            int_states: core::ptr::null_mut(),
            float_states: core::ptr::null_mut(),
            double_states: core::ptr::null_mut(),
        }
    }
}

pub type GetInfoFn = unsafe extern "C" fn() -> *const RawModelInfo;
pub type PrintInfoFn = unsafe extern "C" fn() -> i32;
pub type LifecycleFn = unsafe extern "C" fn(*mut RawInstance) -> i32;
