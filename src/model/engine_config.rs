use super::Credential;

/// Parameters of one engine session
///
/// All three are required and passed to the engine unmodified: the id to
/// `ENGINE_by_id`, the module path and credential as the `MODULE_PATH` and
/// `PIN` control commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Engine id, e.g. `pkcs11`
    pub engine_id: String,
    /// Loadable backend module, e.g. the PKCS#11 provider library
    pub module_path: String,
    /// Access credential for the token
    pub pin: Credential,
}

impl EngineConfig {
    pub fn new(
        engine_id: impl Into<String>,
        module_path: impl Into<String>,
        pin: impl Into<Credential>,
    ) -> Self {
        Self {
            engine_id: engine_id.into(),
            module_path: module_path.into(),
            pin: pin.into(),
        }
    }
}
