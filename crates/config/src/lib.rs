//! Configuration management for the CMOP observer
//!
//! Settings are read from `~/.cmop/config.json` when present and then
//! overridden by `CMOP_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod paths;

pub use paths::{config_path, data_dir};

/// Errors raised while loading or saving configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// CMOP map REST API connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmopApiConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: f64,
}

impl Default for CmopApiConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_api_base() -> String {
    "http://localhost:3000".to_string()
}

fn default_request_timeout() -> f64 {
    30.0
}

/// Language model endpoint (any OpenAI-compatible chat API, Ollama included)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_llm_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base: default_llm_api_base(),
            api_key: String::new(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_model() -> String {
    "qwen2.5:14b-instruct".to_string()
}

fn default_llm_api_base() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.2
}

/// Reasoning loop behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
        }
    }
}

fn default_max_iterations() -> u32 {
    15
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub cmop: CmopApiConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

impl Config {
    /// Load from the default location, then apply environment overrides
    pub async fn load() -> Result<Self> {
        let mut config = Self::load_from(&config_path()).await?;
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a specific file; a missing file yields defaults
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config found at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        debug!("Reading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save to the default location
    pub async fn save(&self) -> Result<()> {
        self.save_to(&config_path()).await
    }

    /// Save to a specific file, creating parent directories
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("Writing config to {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Apply `CMOP_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("CMOP_API_BASE") {
            self.cmop.api_base = value;
        }
        if let Some(value) = lookup("CMOP_REQUEST_TIMEOUT") {
            self.cmop.request_timeout_secs = parse_env("CMOP_REQUEST_TIMEOUT", &value)?;
        }
        if let Some(value) = lookup("CMOP_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = lookup("CMOP_LLM_API_BASE") {
            self.llm.api_base = value;
        }
        if let Some(value) = lookup("CMOP_LLM_API_KEY") {
            self.llm.api_key = value;
        }
        if let Some(value) = lookup("CMOP_MAX_ITERATIONS") {
            self.agent.max_iterations = parse_env("CMOP_MAX_ITERATIONS", &value)?;
        }
        Ok(())
    }

    /// CMOP API base URL without a trailing slash
    pub fn api_base(&self) -> &str {
        self.cmop.api_base.trim_end_matches('/')
    }

    /// Request deadline for the CMOP API
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.cmop.request_timeout_secs.max(0.0))
    }

    /// Language model identifier
    pub fn model(&self) -> String {
        self.llm.model.clone()
    }

    /// Language model API key, if one is configured
    pub fn llm_api_key(&self) -> Option<String> {
        if self.llm.api_key.is_empty() {
            None
        } else {
            Some(self.llm.api_key.clone())
        }
    }

    /// Iteration cap for one reasoning run
    pub fn max_iterations(&self) -> u32 {
        self.agent.max_iterations
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Write a default config file unless one already exists
pub async fn init_at(path: &Path) -> Result<Config> {
    if path.exists() {
        warn!("Config already exists at {:?}", path);
    } else {
        Config::default().save_to(path).await?;
        info!("Config written to {:?}", path);
    }

    Config::load_from(path).await
}

/// Write a default config file at the default location
pub async fn init() -> Result<Config> {
    init_at(&config_path()).await
}

/// Resolve an optional explicit config path against the default
pub fn resolve_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(config_path)
}
