//! OpenSSL ENGINE implementation of the Hsm port
//!
//! One [`HsmEngine`] owns one engine session. Construction walks the session
//! from "not loaded" to "ready" in a single sequence (load by id, configure
//! module path, configure credential, init); a value of this type therefore
//! always refers to a ready session, and key loading on anything else cannot
//! be expressed. Dropping it finishes the session and frees the engine.

use std::ffi::{c_int, CStr, CString};
use std::fmt;
use std::ptr::{self, NonNull};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::NativeResult;
use crate::model::EngineConfig;
use crate::native::ffi::EVP_PKEY;
use crate::native::{
    call_checked, call_checked_ptr, to_c_string, EngineHandle, IsOne, KeyHandle, NativeLib,
};
use crate::ports::{Hsm, KeyAccess};

const CMD_MODULE_PATH: &CStr = c"MODULE_PATH";
const CMD_PIN: &CStr = c"PIN";
/// `cmd_optional = 0`: fail if the engine does not know the command
const CMD_REQUIRED: c_int = 0;

/// HSM backed by an OpenSSL engine, e.g. `pkcs11` with a PKCS#11 module
pub struct HsmEngine {
    // Dropped after `Drop::drop` has finished the session.
    engine: EngineHandle,
    id: String,
    // The engine may keep pointers into these; they must outlive the session.
    module_path: CString,
    _pin: CString,
}

impl HsmEngine {
    /// Load, configure and start an engine session
    ///
    /// # Errors
    ///
    /// Returns the [`NativeError`](crate::NativeError) of the first step that
    /// fails. Later steps are not attempted, and an engine that was already
    /// loaded is freed again.
    pub fn new(lib: Arc<dyn NativeLib>, config: &EngineConfig) -> NativeResult<Self> {
        let id = to_c_string("engine id", &config.engine_id)?;
        let module_path = to_c_string("module path", &config.module_path)?;
        let pin = to_c_string("credential", config.pin.expose())?;

        let raw = call_checked_ptr(lib.as_ref(), || lib.engine_by_id(&id))?;
        // SAFETY: `raw` was just returned by `lib` and nobody else holds it.
        let engine = unsafe { EngineHandle::from_raw(lib.clone(), raw) };
        debug!("Loaded engine {}", config.engine_id);

        // SAFETY (all calls below): `engine` stays live until it is dropped.
        call_checked::<IsOne, _>(lib.as_ref(), || unsafe {
            lib.engine_ctrl_cmd_string(
                engine.as_ptr(),
                CMD_MODULE_PATH,
                &module_path,
                CMD_REQUIRED,
            )
        })?;
        debug!("Configured module path {}", config.module_path);

        call_checked::<IsOne, _>(lib.as_ref(), || unsafe {
            lib.engine_ctrl_cmd_string(engine.as_ptr(), CMD_PIN, &pin, CMD_REQUIRED)
        })?;
        debug!("Configured credential");

        call_checked::<IsOne, _>(lib.as_ref(), || unsafe { lib.engine_init(engine.as_ptr()) })?;
        info!("Engine {} ready", config.engine_id);

        Ok(Self {
            engine,
            id: config.engine_id.clone(),
            module_path,
            _pin: pin,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn lib(&self) -> &dyn NativeLib {
        self.engine.lib().as_ref()
    }

    fn wrap_key(&self, raw: NonNull<EVP_PKEY>) -> KeyHandle {
        // SAFETY: `raw` was just returned by the engine's library and is owned
        // by nobody else.
        unsafe { KeyHandle::from_raw(self.engine.lib().clone(), raw) }
    }
}

impl Hsm for HsmEngine {
    fn load_public_key(&self, _access: &KeyAccess, key_id: &str) -> NativeResult<KeyHandle> {
        let c_key_id = to_c_string("key id", key_id)?;
        let lib = self.lib();
        let raw = call_checked_ptr(lib, || unsafe {
            // SAFETY: the session is initialized for as long as `self` lives.
            lib.engine_load_public_key(
                self.engine.as_ptr(),
                &c_key_id,
                ptr::null_mut(),
                ptr::null_mut(),
            )
        })?;
        debug!("Loaded public key {} from engine {}", key_id, self.id);
        Ok(self.wrap_key(raw))
    }

    fn load_private_key(&self, _access: &KeyAccess, key_id: &str) -> NativeResult<KeyHandle> {
        let c_key_id = to_c_string("key id", key_id)?;
        let lib = self.lib();
        let raw = call_checked_ptr(lib, || unsafe {
            lib.engine_load_private_key(
                self.engine.as_ptr(),
                &c_key_id,
                ptr::null_mut(),
                ptr::null_mut(),
            )
        })?;
        debug!("Loaded private key {} from engine {}", key_id, self.id);
        Ok(self.wrap_key(raw))
    }
}

impl Drop for HsmEngine {
    fn drop(&mut self) {
        let lib = self.engine.lib().clone();
        let engine = self.engine.as_ptr();
        // SAFETY: a constructed `HsmEngine` always holds an initialized engine.
        match call_checked::<IsOne, _>(lib.as_ref(), || unsafe { lib.engine_finish(engine) }) {
            Ok(_) => info!("Engine {} finished", self.id),
            Err(e) => warn!("Failed to finish engine {}: {}", self.id, e),
        }
        // `self.engine` is freed when the fields drop
    }
}

impl fmt::Debug for HsmEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HsmEngine")
            .field("id", &self.id)
            .field("module_path", &self.module_path)
            .field("pin", &"[REDACTED]")
            .field("engine", &self.engine)
            .finish()
    }
}
