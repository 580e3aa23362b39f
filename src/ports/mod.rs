//! Ports (traits) for external key stores
//!
//! The key wrappers depend on these abstractions, not on a concrete
//! backend. The engine adapter is one implementation; PKCS#11-native or
//! cloud KMS backends would be others.

mod hsm;

pub use hsm::{Hsm, KeyAccess};
