//! Error types for hsm-engine
//!
//! `NativeError` is the single failure kind produced by the checked native
//! call layer and everything built directly on it (engine sessions, key
//! loading). `HsmError` sits above it and adds the failures of the key
//! wrappers and of native library selection.

use std::ffi::c_ulong;

use thiserror::Error;

use crate::native::NativeLib;

/// Result type alias for operations that only touch the native layer
pub type NativeResult<T> = Result<T, NativeError>;

/// Result type alias for hsm-engine operations
///
/// This is a convenience alias for `Result<T, HsmError>`.
pub type HsmResult<T> = Result<T, HsmError>;

/// Top-level error type for all hsm-engine operations
#[derive(Error, Debug)]
pub enum HsmError {
    /// A native call failed its success policy
    #[error("Native operation failed: {0}")]
    Native(#[from] NativeError),

    /// Key material was loaded but cannot be used
    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    /// No native library is available in this build
    #[error("Native library unavailable: {reason}")]
    LibraryUnavailable { reason: String },
}

/// A native call reported failure
///
/// The message is taken from the most recent entry of the native error
/// queue, formatted as `"<description>: <code>"`. The queue is per thread,
/// so the error must be built on the thread that made the failing call and
/// before any other native call runs there.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct NativeError {
    message: String,
    code: c_ulong,
}

impl NativeError {
    /// Report the most recent entry of the native error queue, then clear it
    ///
    /// A failing libcrypto call may push several entries; the last one is
    /// the most specific. Clearing the whole queue keeps the remaining ones
    /// from being blamed on a later, unrelated failure. Call this
    /// immediately after the failing native call.
    pub fn from_error_queue(lib: &dyn NativeLib) -> Self {
        let code = lib.err_peek_last_error();
        let description = lib.err_error_string(code);
        lib.err_clear_error();
        Self {
            message: format!("{}: {}", description, code),
            code,
        }
    }

    /// Failure detected on our side before any native call was made
    ///
    /// Carries code 0 and leaves the native error queue untouched.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: 0,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Numeric code of the native error queue entry, 0 if none was read
    pub fn code(&self) -> c_ulong {
        self.code
    }
}

/// Errors raised by the key wrappers after a key was loaded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The loaded key has a type this crate does not handle
    #[error("Unsupported key type: NID {nid}")]
    UnsupportedKeyType { nid: i32 },
}
