// ABOUTME: Configuration parsing from TOML file with environment variable overrides
// ABOUTME: Provides sensible defaults matching the backend's expectations
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// WebSocket endpoint for the persistent channel. Absent means
    /// request/response only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_language")]
    pub language: String,
    /// Whether to establish an agent session at activation.
    #[serde(default = "default_agent_mode")]
    pub agent_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: String,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_language() -> String {
    "python".to_string()
}

fn default_agent_mode() -> bool {
    true
}

fn default_storage_path() -> String {
    "./banter-data".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            socket_url: None,
            model: default_model(),
            language: default_language(),
            agent_mode: default_agent_mode(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from banter.toml with environment variable overrides
    pub fn load() -> Result<Self> {
        let config_path = "banter.toml";
        let mut config = if Path::new(config_path).exists() {
            let content =
                std::fs::read_to_string(config_path).context("Failed to read banter.toml")?;
            toml::from_str::<Config>(&content).context("Failed to parse banter.toml")?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string (no environment overrides).
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration")
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("BANTER_BASE_URL") {
            self.backend.base_url = val;
        }
        if let Ok(val) = std::env::var("BANTER_SOCKET_URL") {
            self.backend.socket_url = Some(val);
        }
        if let Ok(val) = std::env::var("BANTER_MODEL") {
            self.backend.model = val;
        }
        if let Ok(val) = std::env::var("BANTER_LANGUAGE") {
            self.backend.language = val;
        }
        if let Ok(val) = std::env::var("BANTER_AGENT_MODE") {
            self.backend.agent_mode = val == "true" || val == "1";
        }
        if let Ok(val) = std::env::var("BANTER_STORAGE_PATH") {
            self.storage.path = val;
        }
    }
}
