//! The seam between the lifecycle controller and a component model.

use std::path::Path;

use mh_layout::{PackedBuffer, StateMemory};

use crate::entry::{Capabilities, LifecycleCall};
use crate::error::BindResult;
use crate::metadata::ModelMetadata;

/// Everything a model sees during one lifecycle call.
///
/// The buffers belong to the instance and persist across calls; the state
/// memory is borrowed from the host for this call only.
#[derive(Debug)]
pub struct ModelContext<'a> {
    pub time: f64,
    pub emt_rms_mode: u8,
    pub parameters: &'a mut PackedBuffer,
    pub inputs: &'a mut PackedBuffer,
    pub outputs: &'a mut PackedBuffer,
    pub states: StateMemory<'a>,
}

/// Result of one lifecycle call: the raw severity code plus whatever the
/// model left in its message slots.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallReply {
    pub code: i32,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl CallReply {
    pub fn ok() -> Self {
        Self::default()
    }

    /// Success with a general message for the host log.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            code: 1,
            message: Some(text.into()),
            error: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            code: 2,
            message: None,
            error: Some(text.into()),
        }
    }
}

/// A bound component model.
pub trait ComponentModel {
    fn metadata(&self) -> &ModelMetadata;

    /// Which optional entry points exist.
    fn capabilities(&self) -> Capabilities;

    /// Invoke a lifecycle entry point.
    ///
    /// Returns `None` when the call targets an optional entry point the model
    /// does not provide; the caller treats that as skipped.
    fn call(&mut self, call: LifecycleCall, ctx: &mut ModelContext<'_>) -> Option<CallReply>;

    /// Ask the model to print its own description. `None` when unsupported.
    fn print_info(&mut self) -> Option<i32> {
        None
    }
}

/// Turns a manifest path into a bound model.
pub trait ModelLoader {
    fn load(&mut self, path: &Path) -> BindResult<Box<dyn ComponentModel>>;
}

impl<F> ModelLoader for F
where
    F: FnMut(&Path) -> BindResult<Box<dyn ComponentModel>>,
{
    fn load(&mut self, path: &Path) -> BindResult<Box<dyn ComponentModel>> {
        self(path)
    }
}
