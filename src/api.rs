use std::sync::Arc;

use crate::adapters::HsmEngine;
use crate::error::{HsmError, HsmResult};
use crate::native::NativeLib;

pub use crate::model::*;

/// The native library this build links against
///
/// # Errors
///
/// [`HsmError::LibraryUnavailable`] when the crate was built without the
/// `openssl` feature.
#[cfg(feature = "openssl")]
pub fn native_library() -> HsmResult<Arc<dyn NativeLib>> {
    Ok(crate::native::OpenSslLib::shared())
}

#[cfg(not(feature = "openssl"))]
pub fn native_library() -> HsmResult<Arc<dyn NativeLib>> {
    Err(HsmError::LibraryUnavailable {
        reason: "built without the `openssl` feature".to_string(),
    })
}

/// Open a ready engine session on the linked native library
pub fn open_engine(config: &EngineConfig) -> HsmResult<HsmEngine> {
    let lib = native_library()?;
    Ok(HsmEngine::new(lib, config)?)
}
