//! Native crypto library seam
//!
//! Every libcrypto function on the HSM path goes through [`NativeLib`].
//! Nothing outside this module calls the C API directly, which keeps the
//! checked-call discipline in one place and lets tests substitute a
//! recording library.

mod checked;
mod handle;
#[cfg(test)]
pub mod mock;
#[cfg(feature = "openssl")]
mod openssl;

use std::ffi::{c_int, c_ulong, c_void, CStr, CString};

use crate::error::{NativeError, NativeResult};

pub use checked::{
    call_checked, call_checked_ptr, IsNonNegative, IsNonNull, IsOne, IsPositive, ReturnCheck,
};
pub use handle::{EngineHandle, EngineResource, KeyHandle, KeyResource, NativeResource, Owned};
#[cfg(feature = "openssl")]
pub use openssl::OpenSslLib;

/// Opaque native types
///
/// With the `openssl` feature these are the `openssl-sys` declarations, so
/// pointers can be handed straight to libcrypto.
#[allow(non_camel_case_types)]
pub mod ffi {
    #[cfg(feature = "openssl")]
    pub use openssl_sys::{ENGINE, EVP_PKEY};

    #[cfg(not(feature = "openssl"))]
    pub enum ENGINE {}

    #[cfg(not(feature = "openssl"))]
    pub enum EVP_PKEY {}

    /// `UI_METHOD` is only ever passed as null
    pub type UI_METHOD = std::ffi::c_void;
}

use ffi::{ENGINE, EVP_PKEY, UI_METHOD};

/// The native entry points used by engine sessions and key wrappers
///
/// Return conventions follow libcrypto: integer status codes and nullable
/// pointers. They are not interpreted here; the checked-call
/// layer applies the success policy per call site.
///
/// The error queue read by [`err_peek_last_error`](NativeLib::err_peek_last_error)
/// must be thread-local (OpenSSL 1.1.0 and later). Implementations backed by
/// a process-global queue are not safe to use from more than one thread.
pub trait NativeLib: Send + Sync {
    /// Code of the most recent entry in the thread's error queue (0 if empty)
    ///
    /// Leaves the queue unchanged.
    fn err_peek_last_error(&self) -> c_ulong;

    /// Remove every entry from the thread's error queue
    fn err_clear_error(&self);

    /// Human-readable description of an error code
    fn err_error_string(&self, code: c_ulong) -> String;

    /// Look up an engine by id, returning a structural reference or null
    fn engine_by_id(&self, id: &CStr) -> *mut ENGINE;

    /// Send a control command by name
    ///
    /// # Safety
    ///
    /// `engine` must be a live handle returned by this library.
    unsafe fn engine_ctrl_cmd_string(
        &self,
        engine: *mut ENGINE,
        cmd_name: &CStr,
        arg: &CStr,
        cmd_optional: c_int,
    ) -> c_int;

    /// Acquire a functional reference (start the session)
    ///
    /// # Safety
    ///
    /// `engine` must be a live handle returned by this library.
    unsafe fn engine_init(&self, engine: *mut ENGINE) -> c_int;

    /// Release the functional reference taken by `engine_init`
    ///
    /// # Safety
    ///
    /// `engine` must be a live, initialized handle returned by this library.
    unsafe fn engine_finish(&self, engine: *mut ENGINE) -> c_int;

    /// Release the structural reference taken by `engine_by_id`
    ///
    /// # Safety
    ///
    /// `engine` must be a live handle returned by this library and must not
    /// be used afterwards.
    unsafe fn engine_free(&self, engine: *mut ENGINE) -> c_int;

    /// # Safety
    ///
    /// `engine` must be a live, initialized handle. `ui_method` and
    /// `callback_data` must be null or valid for the engine.
    unsafe fn engine_load_public_key(
        &self,
        engine: *mut ENGINE,
        key_id: &CStr,
        ui_method: *mut UI_METHOD,
        callback_data: *mut c_void,
    ) -> *mut EVP_PKEY;

    /// # Safety
    ///
    /// Same requirements as [`engine_load_public_key`](NativeLib::engine_load_public_key).
    unsafe fn engine_load_private_key(
        &self,
        engine: *mut ENGINE,
        key_id: &CStr,
        ui_method: *mut UI_METHOD,
        callback_data: *mut c_void,
    ) -> *mut EVP_PKEY;

    /// # Safety
    ///
    /// `key` must be a live key returned by this library and must not be
    /// used afterwards.
    unsafe fn evp_pkey_free(&self, key: *mut EVP_PKEY);

    /// NID of the key's type, `NID_undef` (0) on failure
    ///
    /// # Safety
    ///
    /// `key` must be a live key returned by this library.
    unsafe fn evp_pkey_id(&self, key: *const EVP_PKEY) -> c_int;

    /// Maximum size in bytes of a signature or ciphertext made with the key
    ///
    /// # Safety
    ///
    /// `key` must be a live key returned by this library.
    unsafe fn evp_pkey_size(&self, key: *const EVP_PKEY) -> c_int;
}

/// Convert an identifier for the C API
///
/// Interior NUL bytes cannot be represented; this is reported as a
/// [`NativeError`] without a native call.
pub(crate) fn to_c_string(what: &str, value: &str) -> NativeResult<CString> {
    CString::new(value).map_err(|e| {
        NativeError::with_message(format!(
            "{} contains a NUL byte at position {}",
            what,
            e.nul_position()
        ))
    })
}
