//! JSON configuration file and its validation.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llm;
use crate::whatsapp::GatewayConfig;
use crate::whatsapp::gateway::DEFAULT_GRAPH_URL;

/// Environment variable consulted when the config file has no LLM key.
pub const LLM_API_KEY_ENV: &str = "GROQ_API_KEY";

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    /// WhatsApp Cloud API access token
    access_token: String,
    /// Graph API version, e.g. "v18.0"
    api_version: String,
    phone_number_id: String,
    /// Where replies are sent
    recipient_waid: String,
    #[serde(default)]
    llm_api_key: String,
    llm_model: Option<String>,
    llm_base_url: Option<String>,
    graph_base_url: Option<String>,
    #[serde(default = "default_send_timeout_secs")]
    send_timeout_secs: u64,
    /// Expense store, relative to data_dir unless absolute.
    data_file: Option<String>,
    /// Directory for state files (store, logs). Defaults to current directory.
    data_dir: Option<String>,
    #[serde(default)]
    whatsapp_formatting: bool,
}

fn default_send_timeout_secs() -> u64 {
    10
}

pub struct Config {
    pub access_token: String,
    pub api_version: String,
    pub phone_number_id: String,
    pub recipient_waid: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub llm_base_url: String,
    pub graph_base_url: String,
    pub send_timeout: Duration,
    /// Directory for state files (store, logs).
    pub data_dir: PathBuf,
    /// Resolved path of the JSON record store.
    pub data_file: PathBuf,
    /// Apply WhatsApp-style text cleanup to replies.
    pub whatsapp_formatting: bool,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    fn load_with_env<P, F>(path: P, env: F) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;

        // Validate required fields
        for (name, value) in [
            ("access_token", &file.access_token),
            ("api_version", &file.api_version),
            ("phone_number_id", &file.phone_number_id),
            ("recipient_waid", &file.recipient_waid),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{name} is required")));
            }
        }
        // Graph versions look like v18.0
        if !file.api_version.starts_with('v') || file.api_version[1..].parse::<f32>().is_err() {
            return Err(ConfigError::Validation(format!(
                "api_version '{}' appears invalid (expected format: v18.0)",
                file.api_version
            )));
        }
        if file.send_timeout_secs == 0 {
            return Err(ConfigError::Validation("send_timeout_secs must be positive".into()));
        }

        let llm_api_key = if file.llm_api_key.is_empty() {
            env(LLM_API_KEY_ENV).unwrap_or_default()
        } else {
            file.llm_api_key
        };
        if llm_api_key.is_empty() {
            return Err(ConfigError::Validation(format!(
                "llm_api_key is required (or set {LLM_API_KEY_ENV})"
            )));
        }

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let data_file = data_dir.join(file.data_file.as_deref().unwrap_or("data.json"));

        Ok(Self {
            access_token: file.access_token,
            api_version: file.api_version,
            phone_number_id: file.phone_number_id,
            recipient_waid: file.recipient_waid,
            llm_api_key,
            llm_model: file.llm_model.unwrap_or_else(|| llm::DEFAULT_MODEL.to_string()),
            llm_base_url: file.llm_base_url.unwrap_or_else(|| llm::DEFAULT_BASE_URL.to_string()),
            graph_base_url: file.graph_base_url.unwrap_or_else(|| DEFAULT_GRAPH_URL.to_string()),
            send_timeout: Duration::from_secs(file.send_timeout_secs),
            data_dir,
            data_file,
            whatsapp_formatting: file.whatsapp_formatting,
        })
    }

    pub fn gateway(&self) -> GatewayConfig {
        GatewayConfig {
            base_url: self.graph_base_url.clone(),
            api_version: self.api_version.clone(),
            phone_number_id: self.phone_number_id.clone(),
            access_token: self.access_token.clone(),
            timeout: self.send_timeout,
        }
    }
}
