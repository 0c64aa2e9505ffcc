// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::OptimizeError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_quality() -> u8 {
    75
}

fn default_max_width() -> u32 {
    3840
}

fn default_key_prefix() -> String {
    "hachidori".to_string()
}

/// Default result TTL (1 hour)
fn default_result_ttl_seconds() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Quality used when a caller does not pass one (1-100)
    #[serde(default = "default_quality")]
    pub default_quality: u8,
    /// Largest width a caller may request
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    #[serde(default)]
    pub allow_svg: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            default_quality: default_quality(),
            max_width: default_max_width(),
            allow_svg: false,
        }
    }
}

impl OptimizerConfig {
    /// Reject widths above `max_width`
    pub fn check_width(&self, width: u32) -> Result<(), OptimizeError> {
        if width > self.max_width {
            return Err(OptimizeError::invalid_param(
                "width",
                format!("must be at most {}", self.max_width),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Redis URL; results stay in process memory when unset
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_result_ttl_seconds")]
    pub result_ttl_seconds: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            key_prefix: default_key_prefix(),
            result_ttl_seconds: default_result_ttl_seconds(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        let quality = self.optimizer.default_quality;
        if !(1..=100).contains(&quality) {
            return Err(format!(
                "optimizer.default_quality must be between 1 and 100, got {}",
                quality
            ));
        }

        if self.optimizer.max_width == 0 {
            return Err("optimizer.max_width must be positive".to_string());
        }

        if self.queue.key_prefix.is_empty() {
            return Err("queue.key_prefix cannot be empty".to_string());
        }

        if let Some(url) = &self.queue.redis_url {
            if !url.starts_with("redis://") && !url.starts_with("rediss://") {
                return Err(format!(
                    "queue.redis_url '{}' must start with redis:// or rediss://",
                    url
                ));
            }
        }

        if self.queue.result_ttl_seconds == 0 {
            return Err("queue.result_ttl_seconds must be positive".to_string());
        }

        if self.logging.level.trim().is_empty() {
            return Err("logging.level cannot be empty".to_string());
        }

        Ok(())
    }
}
