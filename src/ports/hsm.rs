//! Hsm trait - capability to load keys held by an external key store

use crate::error::NativeResult;
use crate::native::KeyHandle;

/// Proof that the caller is one of the crate's key wrappers
///
/// Backends outside this crate can name the type and so implement [`Hsm`],
/// but only [`PublicKey`](crate::PublicKey) and [`Keypair`](crate::Keypair)
/// can construct it. Application code therefore never sees a raw key handle
/// that bypasses the wrappers.
///
/// The token is only lent for the duration of one `load_*` call. A backend
/// implementation can forward it to another [`Hsm`] within that call, so
/// backends themselves are trusted code.
///
/// ```compile_fail
/// let access = hsm_engine::KeyAccess { _private: () };
/// ```
#[derive(Debug)]
pub struct KeyAccess {
    _private: (),
}

impl KeyAccess {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// Capability to load keys from a hardware security module
///
/// Keys are referenced by an opaque identifier that is handed to the
/// backend unmodified. A backend may keep private keys non-exportable; the
/// returned handle then refers to key material that stays on the device.
///
/// Both operations fail with the backend's [`NativeError`](crate::NativeError)
/// unchanged. A missing key, a wrong credential and an unreachable device
/// are not told apart here.
pub trait Hsm {
    /// Load the public key named `key_id`
    ///
    /// Every call goes to the backend; nothing is cached, and repeated
    /// calls may return distinct handles.
    fn load_public_key(&self, access: &KeyAccess, key_id: &str) -> NativeResult<KeyHandle>;

    /// Load the private key named `key_id`
    fn load_private_key(&self, access: &KeyAccess, key_id: &str) -> NativeResult<KeyHandle>;
}
