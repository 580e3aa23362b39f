//! Load keys from hardware security modules through OpenSSL engines
//!
//! Every native call is checked against the success convention of the
//! function it calls, and every native resource has exactly one Rust owner
//! that releases it. An [`HsmEngine`] is always a ready session; keys are
//! loaded from it through [`PublicKey::from_hsm`] and [`Keypair::from_hsm`].

mod adapters;
pub mod api;
pub mod error;
mod key;
pub mod model;
pub mod native;
pub mod ports;

// Re-export commonly used types
pub use adapters::HsmEngine;
pub use error::{HsmError, HsmResult, KeyError, NativeError, NativeResult};
pub use key::{Keypair, PublicKey};
pub use model::{Credential, EngineConfig, KeyType};
pub use ports::{Hsm, KeyAccess};

// Re-export public API
pub use api::{native_library, open_engine};
