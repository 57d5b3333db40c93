//! Configuration management for pulsed.
//!
//! Loads settings from a TOML file or uses defaults. All values are fixed for
//! the lifetime of the process.

use pulse_common::PulseError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Default config file path
pub const CONFIG_PATH: &str = "/etc/pulse/config.toml";

/// Generation engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine strategy: "ollama" or "mock"
    #[serde(default = "default_engine_mode")]
    pub mode: String,

    /// Ollama API endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model name passed to the engine
    #[serde(default = "default_model")]
    pub model: String,

    /// Generation cap in tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// HTTP timeout for one generation call. The pipeline itself applies no
    /// timeout; this is the only bound on a slow model.
    #[serde(default = "default_engine_timeout")]
    pub timeout_secs: u64,
}

fn default_engine_mode() -> String {
    "ollama".to_string()
}

fn default_endpoint() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_model() -> String {
    "phi4-mini".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_engine_timeout() -> u64 {
    120
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: default_engine_mode(),
            endpoint: default_endpoint(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_engine_timeout(),
        }
    }
}

/// Result cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_maxsize")]
    pub maxsize: usize,

    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
}

fn default_cache_maxsize() -> usize {
    128
}

fn default_cache_ttl() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            maxsize: default_cache_maxsize(),
            ttl_seconds: default_cache_ttl(),
        }
    }
}

/// Input limits enforced around the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum feedback items accepted per request (HTTP layer)
    #[serde(default = "default_max_feedback_items")]
    pub max_feedback_items: usize,

    /// Entries longer than this are dropped by the safety filter
    #[serde(default = "default_max_entry_chars")]
    pub max_entry_chars: usize,
}

fn default_max_feedback_items() -> usize {
    500
}

fn default_max_entry_chars() -> usize {
    500
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_feedback_items: default_max_feedback_items(),
            max_entry_chars: default_max_entry_chars(),
        }
    }
}

/// Top-level daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// System instruction file for the prompt builder. Absence is non-fatal;
    /// a built-in minimal instruction is used instead.
    #[serde(default = "default_system_prompt_path")]
    pub system_prompt_path: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub limits: LimitsConfig,
}

fn default_bind_addr() -> String {
    "127.0.0.1:7910".to_string()
}

fn default_system_prompt_path() -> String {
    "prompts/analysis_system.txt".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            system_prompt_path: default_system_prompt_path(),
            log_level: default_log_level(),
            engine: EngineConfig::default(),
            cache: CacheConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

impl PulseConfig {
    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self, PulseError> {
        if !path.exists() {
            warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: PulseConfig = toml::from_str(&content)
            .map_err(|e| PulseError::Config(format!("{}: {}", path.display(), e)))?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}
