/// Execution provider preference, in registration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda { device_id: u32 },
}

/// Options handed to session construction.
///
/// `log_id` tags the engine's diagnostics; `providers` is an ordered
/// preference list. The engine always keeps CPU as the fallback provider.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub log_id: String,
    pub providers: Vec<Device>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            log_id: "sample".to_string(),
            providers: vec![Device::Cpu],
        }
    }
}

impl SessionConfig {
    pub fn with_log_id(mut self, log_id: impl Into<String>) -> Self {
        self.log_id = log_id.into();
        self
    }

    pub fn with_providers(mut self, providers: Vec<Device>) -> Self {
        self.providers = providers;
        self
    }
}
