//! Return codes of the component-model lifecycle calls.

use crate::{CoreError, CoreResult};

/// Severity reported by every lifecycle call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnCode {
    /// Call succeeded.
    Ok,
    /// Call succeeded; the model left a general message for the host log.
    Message,
    /// Call failed; the model left an error message and the simulation
    /// cannot continue.
    Error,
}

impl ReturnCode {
    pub fn from_raw(code: i32) -> CoreResult<Self> {
        match code {
            0 => Ok(ReturnCode::Ok),
            1 => Ok(ReturnCode::Message),
            2 => Ok(ReturnCode::Error),
            other => Err(CoreError::UnknownReturnCode { code: other }),
        }
    }

    pub fn raw(self) -> i32 {
        match self {
            ReturnCode::Ok => 0,
            ReturnCode::Message => 1,
            ReturnCode::Error => 2,
        }
    }

    pub fn is_fatal(self) -> bool {
        self == ReturnCode::Error
    }
}
