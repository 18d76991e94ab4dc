mod chat;

pub use chat::{
    clamp_max_tokens, clamp_temperature, find_model, ChatSettings, ModelInfo, PartialSettings,
    SUPPORTED_MODELS,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::constants::{defaults, endpoints, paths};

/// Application configuration, read from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    pub endpoint: String,
    pub api_key_env: String,
    /// Extra headers sent with every completion request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub bind: String,
    /// Where clients reach the gateway's chat route.
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    #[serde(default)]
    pub backend: BackendKind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Send turns over HTTP to a running gateway.
    #[default]
    Gateway,
    /// Run the gateway logic in-process against the completion endpoint.
    Direct,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoints::COMPLETION_URL.to_string(),
            api_key_env: defaults::API_KEY_ENV.to_string(),
            headers: BTreeMap::new(),
        }
    }
}

impl CompletionConfig {
    /// Get the API key from the environment variable named in the config.
    pub fn api_key(&self) -> Option<String> {
        if self.api_key_env.is_empty() {
            return None;
        }
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: endpoints::GATEWAY_BIND.to_string(),
            url: endpoints::GATEWAY_URL.to_string(),
        }
    }
}

impl AppConfig {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(paths::CONFIG_DIR)
            .join(paths::CONFIG_FILE)
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Read a config file, falling back to defaults when it is missing or invalid.
    pub fn load_from(path: &std::path::Path) -> Self {
        let mut config = Self::default();
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(parsed) => config = parsed,
                    Err(e) => tracing::warn!("Ignoring invalid config {}: {e}", path.display()),
                },
                Err(e) => tracing::warn!("Could not read config {}: {e}", path.display()),
            }
        }
        config.apply_env();
        config
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), crate::error::ParleyError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ParleyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var(paths::DATA_DIR_ENV) {
            if !dir.is_empty() {
                self.storage.data_dir = Some(PathBuf::from(dir));
            }
        }
        if let Ok(url) = std::env::var(paths::GATEWAY_URL_ENV) {
            if !url.is_empty() {
                self.gateway.url = url;
            }
        }
    }

    /// Directory holding the persisted conversations and settings.
    pub fn data_dir(&self) -> PathBuf {
        self.storage.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(paths::DATA_DIR)
        })
    }
}
