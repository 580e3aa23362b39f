//! System libcrypto backend
//!
//! `openssl-sys` links libcrypto and declares the `EVP_PKEY` functions. The
//! ENGINE API and the error-queue functions it leaves out are declared here
//! against the same library.

use std::ffi::{c_char, c_int, c_ulong, c_void, CStr};
use std::sync::{Arc, OnceLock};

use tracing::debug;

use super::ffi::{ENGINE, EVP_PKEY, UI_METHOD};
use super::NativeLib;

/// Size recommended by OpenSSL for `ERR_error_string_n` output
const ERROR_STRING_LEN: usize = 256;

extern "C" {
    fn ERR_peek_last_error() -> c_ulong;
    fn ERR_clear_error();
    fn ERR_error_string_n(e: c_ulong, buf: *mut c_char, len: usize);

    fn ENGINE_by_id(id: *const c_char) -> *mut ENGINE;
    fn ENGINE_ctrl_cmd_string(
        e: *mut ENGINE,
        cmd_name: *const c_char,
        arg: *const c_char,
        cmd_optional: c_int,
    ) -> c_int;
    fn ENGINE_init(e: *mut ENGINE) -> c_int;
    fn ENGINE_finish(e: *mut ENGINE) -> c_int;
    fn ENGINE_free(e: *mut ENGINE) -> c_int;
    fn ENGINE_load_public_key(
        e: *mut ENGINE,
        key_id: *const c_char,
        ui_method: *mut UI_METHOD,
        callback_data: *mut c_void,
    ) -> *mut EVP_PKEY;
    fn ENGINE_load_private_key(
        e: *mut ENGINE,
        key_id: *const c_char,
        ui_method: *mut UI_METHOD,
        callback_data: *mut c_void,
    ) -> *mut EVP_PKEY;
}

/// [`NativeLib`] backed by the system libcrypto
#[derive(Debug)]
pub struct OpenSslLib {
    _private: (),
}

impl OpenSslLib {
    /// The process-wide instance; libcrypto is initialized on first use
    pub fn shared() -> Arc<dyn NativeLib> {
        static SHARED: OnceLock<Arc<OpenSslLib>> = OnceLock::new();
        SHARED
            .get_or_init(|| {
                openssl_sys::init();
                debug!("Initialized libcrypto");
                Arc::new(OpenSslLib { _private: () })
            })
            .clone()
    }
}

impl NativeLib for OpenSslLib {
    fn err_peek_last_error(&self) -> c_ulong {
        unsafe { ERR_peek_last_error() }
    }

    fn err_clear_error(&self) {
        unsafe { ERR_clear_error() }
    }

    fn err_error_string(&self, code: c_ulong) -> String {
        let mut buf = [0 as c_char; ERROR_STRING_LEN];
        // SAFETY: the buffer length is passed along; the output is always
        // NUL-terminated within it.
        unsafe {
            ERR_error_string_n(code, buf.as_mut_ptr(), buf.len());
            CStr::from_ptr(buf.as_ptr()).to_string_lossy().into_owned()
        }
    }

    fn engine_by_id(&self, id: &CStr) -> *mut ENGINE {
        unsafe { ENGINE_by_id(id.as_ptr()) }
    }

    unsafe fn engine_ctrl_cmd_string(
        &self,
        engine: *mut ENGINE,
        cmd_name: &CStr,
        arg: &CStr,
        cmd_optional: c_int,
    ) -> c_int {
        ENGINE_ctrl_cmd_string(engine, cmd_name.as_ptr(), arg.as_ptr(), cmd_optional)
    }

    unsafe fn engine_init(&self, engine: *mut ENGINE) -> c_int {
        ENGINE_init(engine)
    }

    unsafe fn engine_finish(&self, engine: *mut ENGINE) -> c_int {
        ENGINE_finish(engine)
    }

    unsafe fn engine_free(&self, engine: *mut ENGINE) -> c_int {
        ENGINE_free(engine)
    }

    unsafe fn engine_load_public_key(
        &self,
        engine: *mut ENGINE,
        key_id: &CStr,
        ui_method: *mut UI_METHOD,
        callback_data: *mut c_void,
    ) -> *mut EVP_PKEY {
        ENGINE_load_public_key(engine, key_id.as_ptr(), ui_method, callback_data)
    }

    unsafe fn engine_load_private_key(
        &self,
        engine: *mut ENGINE,
        key_id: &CStr,
        ui_method: *mut UI_METHOD,
        callback_data: *mut c_void,
    ) -> *mut EVP_PKEY {
        ENGINE_load_private_key(engine, key_id.as_ptr(), ui_method, callback_data)
    }

    unsafe fn evp_pkey_free(&self, key: *mut EVP_PKEY) {
        openssl_sys::EVP_PKEY_free(key)
    }

    unsafe fn evp_pkey_id(&self, key: *const EVP_PKEY) -> c_int {
        openssl_sys::EVP_PKEY_id(key as *mut EVP_PKEY)
    }

    unsafe fn evp_pkey_size(&self, key: *const EVP_PKEY) -> c_int {
        openssl_sys::EVP_PKEY_size(key as *mut EVP_PKEY)
    }
}
