use std::ffi::c_int;
use std::fmt;

/// Base type of a loaded key, from its OpenSSL NID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Rsa,
    RsaPss,
    Ec,
    Ed25519,
    Ed448,
}

impl KeyType {
    const NID_RSA: c_int = 6;
    const NID_RSA_PSS: c_int = 912;
    const NID_EC: c_int = 408;
    const NID_ED25519: c_int = 1087;
    const NID_ED448: c_int = 1088;

    /// `None` for key types this crate does not handle
    pub fn from_nid(nid: c_int) -> Option<Self> {
        match nid {
            Self::NID_RSA => Some(KeyType::Rsa),
            Self::NID_RSA_PSS => Some(KeyType::RsaPss),
            Self::NID_EC => Some(KeyType::Ec),
            Self::NID_ED25519 => Some(KeyType::Ed25519),
            Self::NID_ED448 => Some(KeyType::Ed448),
            _ => None,
        }
    }

    pub fn nid(self) -> c_int {
        match self {
            KeyType::Rsa => Self::NID_RSA,
            KeyType::RsaPss => Self::NID_RSA_PSS,
            KeyType::Ec => Self::NID_EC,
            KeyType::Ed25519 => Self::NID_ED25519,
            KeyType::Ed448 => Self::NID_ED448,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyType::Rsa => "RSA",
            KeyType::RsaPss => "RSA-PSS",
            KeyType::Ec => "EC",
            KeyType::Ed25519 => "Ed25519",
            KeyType::Ed448 => "Ed448",
        };
        f.write_str(name)
    }
}
