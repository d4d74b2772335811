pub mod validation;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::negotiate::Encoding;

use self::validation::validate_config;

/// Environment variable overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "UUID_NINJA_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Error type for configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_worker_threads: Option<usize>,
    #[serde(
        default = "default_max_blocking_threads",
        skip_serializing_if = "Option::is_none"
    )]
    pub runtime_max_blocking_threads: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_thread_stack_size_kb: Option<usize>,
    #[serde(default)]
    pub base_path: String,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
#[allow(clippy::unnecessary_wraps)]
fn default_max_blocking_threads() -> Option<usize> {
    Some(8)
}
fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            runtime_worker_threads: None,
            runtime_max_blocking_threads: default_max_blocking_threads(),
            runtime_thread_stack_size_kb: None,
            base_path: String::new(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Backing store for the sequence counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    File,
    Memory,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::File => write!(f, "file"),
            StoreKind::Memory => write!(f, "memory"),
        }
    }
}

/// Sequence counter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceConfig {
    /// Logical actor name; every instance pointed at the same store and
    /// name shares one ordering.
    #[serde(default = "default_sequence_name")]
    pub name: String,
    #[serde(default)]
    pub store: StoreKind,
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
}

fn default_sequence_name() -> String {
    "global".to_string()
}
fn default_store_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            name: default_sequence_name(),
            store: StoreKind::default(),
            store_dir: default_store_dir(),
        }
    }
}

/// Feature flags and settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub default_encoding: Encoding,
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            default_encoding: Encoding::default(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sequence: SequenceConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
}

/// Load configuration from a YAML file and validate it.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when reading the file fails, [`ConfigError::Yaml`]
/// when parsing fails, or [`ConfigError::Validation`] when semantic validation fails.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse and validate configuration from YAML text.
///
/// # Errors
///
/// Returns [`ConfigError::Yaml`] or [`ConfigError::Validation`].
pub fn parse_config(contents: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_yaml::from_str(contents)?;
    validate_config(&config)?;
    Ok(config)
}

/// Config path from [`CONFIG_PATH_ENV`], or [`DEFAULT_CONFIG_PATH`].
#[must_use]
pub fn config_path_from_env() -> String {
    std::env::var(CONFIG_PATH_ENV)
        .ok()
        .filter(|path| !path.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_example_config() {
        let config = load_config("config.example.yaml");
        assert!(
            config.is_ok(),
            "Failed to load example config: {:?}",
            config.err()
        );
        let config = config.unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.sequence.name, "global");
        assert_eq!(config.sequence.store, StoreKind::File);
        assert_eq!(config.features.default_encoding, Encoding::Json);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.max_body_bytes, 64 * 1024);
        assert_eq!(config.sequence.store_dir, PathBuf::from("data"));
        assert_eq!(config.features.log_level, "INFO");
    }

    #[test]
    fn test_store_kind_serde() {
        let config = parse_config("sequence:\n  store: memory\n  name: edge-1\n").unwrap();
        assert_eq!(config.sequence.store, StoreKind::Memory);
        assert_eq!(config.sequence.name, "edge-1");
    }

    #[test]
    fn test_server_config_runtime_defaults() {
        let server = ServerConfig::default();
        assert_eq!(server.runtime_worker_threads, None);
        assert_eq!(server.runtime_max_blocking_threads, Some(8));
        assert_eq!(server.runtime_thread_stack_size_kb, None);
    }

    #[test]
    fn test_default_encoding_txt() {
        let config = parse_config("features:\n  default_encoding: txt\n").unwrap();
        assert_eq!(config.features.default_encoding, Encoding::Txt);
    }
}
