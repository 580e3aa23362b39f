mod credential;
mod engine_config;
mod key_type;

pub use credential::Credential;
pub use engine_config::EngineConfig;
pub use key_type::KeyType;
