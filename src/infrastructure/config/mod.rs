use crate::domain::error::{AppError, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Settings for the AI cleaning agent. When `enabled` is false the service
/// runs with a passthrough agent and never contacts a model endpoint.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AgentConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://localhost:1234/v1".to_string(),
            model: "local-model".to_string(),
            api_key: None,
            max_tokens: Some(1024),
            temperature: Some(0.7),
        }
    }
}

/// Service configuration, merged from defaults, an optional `tablewash.toml`
/// and `TABLEWASH_`-prefixed environment variables (nested keys split on
/// `__`, e.g. `TABLEWASH_AGENT__MODEL`).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub agent: AgentConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            agent: AgentConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn load() -> Result<Self> {
        Figment::from(Serialized::defaults(ServiceConfig::default()))
            .merge(Toml::file("tablewash.toml"))
            .merge(Env::prefixed("TABLEWASH_").split("__"))
            .extract()
            .map_err(|e| AppError::Config(e.to_string()))
    }
}
