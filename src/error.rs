/*
 * Error taxonomy for the control layer. Native call failures carry the OS error
 * code together with the source location that raised them, so a failed window
 * creation can be traced back to the exact call site. Lookup misses are never
 * errors: the router treats them as "pass to default processing".
 */
use crate::types::{ControlId, NativeHandle};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// A native call failed. `description` is the OS text for `code`.
    #[error("native error {code:#010x} at {file}:{line}: {description}")]
    Native {
        code: u32,
        description: String,
        file: &'static str,
        line: u32,
    },

    /// The handle is already registered to another live control.
    #[error("native handle {handle:?} is already registered to control {existing:?}")]
    DuplicateHandle {
        handle: NativeHandle,
        existing: ControlId,
    },

    #[error("initialization failed: {0}")]
    InitializationFailed(String),

    #[error("operation failed: {0}")]
    OperationFailed(String),

    #[error("invalid handle: {0}")]
    InvalidHandle(String),

    #[error("no runtime installed on this thread; create an Application first")]
    RuntimeNotInstalled,

    #[error("control {0:?} has been disposed")]
    Disposed(ControlId),
}

impl PlatformError {
    /// Builds a `Native` error, translating `code` through the OS message table.
    /// Prefer the `native_error!` macro, which fills in the call site.
    pub fn native(code: u32, file: &'static str, line: u32) -> Self {
        PlatformError::Native {
            code,
            description: describe_native_error(code),
            file,
            line,
        }
    }

    pub fn native_code(&self) -> Option<u32> {
        match self {
            PlatformError::Native { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Creates a `PlatformError::Native` for `code` stamped with the current file and line.
#[macro_export]
macro_rules! native_error {
    ($code:expr) => {
        $crate::error::PlatformError::native($code, file!(), line!())
    };
}

#[cfg(target_os = "windows")]
pub(crate) fn describe_native_error(code: u32) -> String {
    let message = windows::core::HRESULT::from_win32(code).message();
    let trimmed = message.trim_end();
    if trimmed.is_empty() {
        "Unidentified error code".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(not(target_os = "windows"))]
pub(crate) fn describe_native_error(code: u32) -> String {
    format!("Unidentified error code {code}")
}
