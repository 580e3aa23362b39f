//! Key wrappers
//!
//! [`PublicKey`] and [`Keypair`] are the only callers of the [`Hsm`] port.
//! They take the loaded handle, check that its type is one this crate
//! understands, and keep it for the rest of their lifetime.

use std::ffi::c_int;

use crate::error::{HsmResult, KeyError, NativeResult};
use crate::model::KeyType;
use crate::native::{call_checked, IsPositive, KeyHandle};
use crate::ports::{Hsm, KeyAccess};

/// A public key, possibly backed by a hardware token
#[derive(Debug)]
pub struct PublicKey {
    key: LoadedKey,
}

/// A private key together with its public half
///
/// When loaded from an HSM the private key material usually stays on the
/// device; the handle only refers to it.
#[derive(Debug)]
pub struct Keypair {
    key: LoadedKey,
}

impl PublicKey {
    /// Load the public key named `key_id` from `hsm`
    ///
    /// # Errors
    ///
    /// - [`HsmError::Native`](crate::HsmError::Native) if the backend fails
    ///   to load the key
    /// - [`HsmError::Key`](crate::HsmError::Key) if the key type is not
    ///   supported; the loaded handle is released
    pub fn from_hsm(hsm: &dyn Hsm, key_id: &str) -> HsmResult<Self> {
        let handle = hsm.load_public_key(&KeyAccess::new(), key_id)?;
        Ok(Self {
            key: LoadedKey::new(handle)?,
        })
    }

    pub fn key_type(&self) -> KeyType {
        self.key.key_type
    }

    /// Maximum signature or ciphertext size in bytes
    pub fn size(&self) -> NativeResult<usize> {
        self.key.size()
    }
}

impl Keypair {
    /// Load the private key named `key_id` from `hsm`
    ///
    /// Fails the same way as [`PublicKey::from_hsm`].
    pub fn from_hsm(hsm: &dyn Hsm, key_id: &str) -> HsmResult<Self> {
        let handle = hsm.load_private_key(&KeyAccess::new(), key_id)?;
        Ok(Self {
            key: LoadedKey::new(handle)?,
        })
    }

    pub fn key_type(&self) -> KeyType {
        self.key.key_type
    }

    pub fn size(&self) -> NativeResult<usize> {
        self.key.size()
    }
}

#[derive(Debug)]
struct LoadedKey {
    handle: KeyHandle,
    key_type: KeyType,
}

impl LoadedKey {
    /// Takes ownership before validating, so a rejected key is still freed
    fn new(handle: KeyHandle) -> HsmResult<Self> {
        let lib = handle.lib().as_ref();
        // SAFETY: `handle` owns a live key from `lib`.
        let nid: c_int = call_checked::<IsPositive, _>(lib, || unsafe {
            lib.evp_pkey_id(handle.as_ptr())
        })?;
        let key_type = KeyType::from_nid(nid).ok_or(KeyError::UnsupportedKeyType { nid })?;
        Ok(Self { handle, key_type })
    }

    fn size(&self) -> NativeResult<usize> {
        let lib = self.handle.lib().as_ref();
        // SAFETY: `self.handle` owns a live key from `lib`.
        let size = call_checked::<IsPositive, _>(lib, || unsafe {
            lib.evp_pkey_size(self.handle.as_ptr())
        })?;
        Ok(size as usize)
    }
}
