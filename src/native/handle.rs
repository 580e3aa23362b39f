//! Owned native handles
//!
//! [`Owned`] is the only way a native resource leaves the checked-call
//! layer. It holds the pointer together with the library that vended it and
//! releases it on drop, so every early return through `?` frees whatever was
//! acquired before it.

use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::native::ffi::{ENGINE, EVP_PKEY};
use crate::native::NativeLib;

/// A native resource type and its release function
pub trait NativeResource {
    type Raw;

    const NAME: &'static str;

    /// Release one reference to `ptr`
    ///
    /// # Safety
    ///
    /// `ptr` must be live, vended by `lib`, and not used afterwards.
    unsafe fn release(lib: &dyn NativeLib, ptr: NonNull<Self::Raw>);
}

/// Structural engine reference, released with `ENGINE_free`
#[derive(Debug)]
pub enum EngineResource {}

impl NativeResource for EngineResource {
    type Raw = ENGINE;

    const NAME: &'static str = "ENGINE";

    unsafe fn release(lib: &dyn NativeLib, ptr: NonNull<ENGINE>) {
        lib.engine_free(ptr.as_ptr());
    }
}

/// Key, released with `EVP_PKEY_free`
#[derive(Debug)]
pub enum KeyResource {}

impl NativeResource for KeyResource {
    type Raw = EVP_PKEY;

    const NAME: &'static str = "EVP_PKEY";

    unsafe fn release(lib: &dyn NativeLib, ptr: NonNull<EVP_PKEY>) {
        lib.evp_pkey_free(ptr.as_ptr());
    }
}

pub type EngineHandle = Owned<EngineResource>;
pub type KeyHandle = Owned<KeyResource>;

/// Exclusive owner of one native resource
///
/// Not `Clone`: two owners of one pointer would release it twice.
pub struct Owned<R: NativeResource> {
    ptr: Option<NonNull<R::Raw>>,
    lib: Arc<dyn NativeLib>,
}

// SAFETY: an `Owned` is the sole owner of its pointer, so moving it to another
// thread cannot create shared access. It is not `Sync`.
unsafe impl<R: NativeResource> Send for Owned<R> {}

impl<R: NativeResource> Owned<R> {
    /// Take ownership of a pointer just returned by `lib`
    ///
    /// # Safety
    ///
    /// `ptr` must be live, vended by `lib`, and owned by nobody else.
    pub unsafe fn from_raw(lib: Arc<dyn NativeLib>, ptr: NonNull<R::Raw>) -> Self {
        Self {
            ptr: Some(ptr),
            lib,
        }
    }

    /// Raw pointer for passing into further native calls
    ///
    /// Null once ownership has been transferred out with [`take`](Self::take).
    pub fn as_ptr(&self) -> *mut R::Raw {
        self.ptr.map_or(std::ptr::null_mut(), NonNull::as_ptr)
    }

    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    /// Transfer ownership out, leaving this owner empty
    ///
    /// The caller becomes responsible for releasing the pointer.
    pub fn take(&mut self) -> Option<NonNull<R::Raw>> {
        self.ptr.take()
    }

    /// Consume the owner without releasing the resource
    pub fn into_raw(mut self) -> Option<NonNull<R::Raw>> {
        self.take()
    }

    /// The library that vended this resource
    pub fn lib(&self) -> &Arc<dyn NativeLib> {
        &self.lib
    }
}

impl<R: NativeResource> Drop for Owned<R> {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            // SAFETY: `from_raw` established that we own a live pointer from
            // `self.lib`; taking it out of the option guarantees a single release.
            unsafe { R::release(self.lib.as_ref(), ptr) };
        }
    }
}

impl<R: NativeResource> fmt::Debug for Owned<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owned")
            .field("type", &R::NAME)
            .field("ptr", &self.as_ptr())
            .finish()
    }
}
