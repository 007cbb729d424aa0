use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../schema/config-v1.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    /// Directory holding uploaded inputs and finished results.
    pub storage_root: String,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Notification delivery; `None` disables email and logs instead.
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

fn default_queue_capacity() -> usize {
    64
}

fn default_max_upload_bytes() -> u64 {
    100 * 1024 * 1024
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_max_attempts() -> usize {
    5
}

fn default_window_secs() -> u64 {
    3600
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            window_secs: default_window_secs(),
        }
    }
}

/// External transformation programs, one per pipeline step. Each is invoked
/// with the current artifact path and writes its output next to it under a
/// step-specific filename suffix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_unlock_tool")]
    pub unlock: String,
    #[serde(default = "default_normalize_tool")]
    pub normalize: String,
    #[serde(default = "default_ocr_tool")]
    pub ocr: String,
    #[serde(default = "default_paginate_tool")]
    pub paginate: String,
    #[serde(default = "default_compress_tool")]
    pub compress: String,
}

fn default_unlock_tool() -> String {
    "unlock-pdf".to_string()
}

fn default_normalize_tool() -> String {
    "fix-pdf-fonts".to_string()
}

fn default_ocr_tool() -> String {
    "ocr-and-index".to_string()
}

fn default_paginate_tool() -> String {
    "add-page-numbers".to_string()
}

fn default_compress_tool() -> String {
    "compress-pdf".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            unlock: default_unlock_tool(),
            normalize: default_normalize_tool(),
            ocr: default_ocr_tool(),
            paginate: default_paginate_tool(),
            compress: default_compress_tool(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default = "default_from_address")]
    pub from_address: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn default_smtp_port() -> u16 {
    25
}

fn default_from_address() -> String {
    "noreply@pdfmill.local".to_string()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| format!("{} at {}", e, e.instance_path()))
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.worker_count == 0 {
        return Err(ConfigError::Validation {
            message: "worker_count must be at least 1".to_string(),
        });
    }

    if config.queue_capacity == 0 {
        return Err(ConfigError::Validation {
            message: "queue_capacity must be at least 1".to_string(),
        });
    }

    if config.rate_limit.max_attempts == 0 || config.rate_limit.window_secs == 0 {
        return Err(ConfigError::Validation {
            message: "rate_limit requires max_attempts and window_secs of at least 1".to_string(),
        });
    }

    Ok(())
}
