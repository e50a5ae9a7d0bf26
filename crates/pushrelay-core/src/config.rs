//! PushRelay configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PushRelayError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PushRelayConfig {
    #[serde(default)]
    pub fcm: FcmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl PushRelayConfig {
    /// Load config from the default path (~/.pushrelay/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PushRelayError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| PushRelayError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| PushRelayError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the PushRelay home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pushrelay")
    }
}

/// FCM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FcmConfig {
    /// Firebase project id, e.g. "my-app-1234".
    #[serde(default)]
    pub project_id: String,
    /// OAuth2 access token for the FCM v1 API.
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_fcm_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_iid_endpoint")]
    pub iid_endpoint: String,
}

fn default_fcm_endpoint() -> String {
    "https://fcm.googleapis.com".into()
}
fn default_iid_endpoint() -> String {
    "https://iid.googleapis.com".into()
}

impl Default for FcmConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            access_token: String::new(),
            endpoint: default_fcm_endpoint(),
            iid_endpoint: default_iid_endpoint(),
        }
    }
}

impl FcmConfig {
    /// Resolve the access token: config value > FCM_ACCESS_TOKEN env > empty.
    pub fn resolve_access_token(&self) -> String {
        if !self.access_token.is_empty() {
            self.access_token.clone()
        } else {
            std::env::var("FCM_ACCESS_TOKEN").unwrap_or_default()
        }
    }
}

/// Chat/LLM configuration (DashScope text-generation API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_chat_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_chat_model")]
    pub model: String,
}

fn bool_true() -> bool {
    true
}
fn default_chat_endpoint() -> String {
    "https://dashscope.aliyuncs.com/api/v1/services/aigc/text-generation/generation".into()
}
fn default_chat_model() -> String {
    "qwen-turbo".into()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: String::new(),
            endpoint: default_chat_endpoint(),
            model: default_chat_model(),
        }
    }
}

impl ChatConfig {
    /// Resolve the API key: config value > DASHSCOPE_API_KEY env > empty.
    pub fn resolve_api_key(&self) -> String {
        if !self.api_key.is_empty() {
            self.api_key.clone()
        } else {
            std::env::var("DASHSCOPE_API_KEY").unwrap_or_default()
        }
    }
}

/// Gateway server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Chat-turn storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// SQLite database path; empty means `<home>/chat.db`.
    #[serde(default)]
    pub db_path: String,
}

impl StorageConfig {
    pub fn resolve_db_path(&self) -> PathBuf {
        if self.db_path.is_empty() {
            PushRelayConfig::home_dir().join("chat.db")
        } else {
            PathBuf::from(&self.db_path)
        }
    }
}
