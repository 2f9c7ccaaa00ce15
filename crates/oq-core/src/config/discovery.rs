//! Configuration discovery and resolution

use super::types::QueueConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("TOML parsing error in {path}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Explicit overrides for configuration
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    /// Path to config file override
    pub config_path: Option<PathBuf>,
    /// Override worker thread name
    pub thread_name: Option<String>,
    /// Override fsync-per-mutation
    pub sync_writes: Option<bool>,
}

/// Resolve configuration from all sources
///
/// Priority (highest to lowest):
/// 1. Explicit overrides
/// 2. Environment variables (`OQ_WORKER_NAME`, `OQ_SYNC_WRITES`,
///    `OQ_LOCK_RETRIES`, `OQ_COMPACT_THRESHOLD`)
/// 3. Config file: `overrides.config_path`, else `OQ_CONFIG`
/// 4. Defaults
///
/// An explicitly requested config file must load; one named by `OQ_CONFIG`
/// is skipped with a warning when it cannot be read or parsed.
pub fn resolve_config(overrides: &ConfigOverrides) -> Result<QueueConfig, ConfigError> {
    let mut config = QueueConfig::default();

    // 3. Config file
    if let Some(ref path) = overrides.config_path {
        config = load_config_file(path)?;
    } else if let Ok(env_path) = std::env::var("OQ_CONFIG") {
        let env_path = PathBuf::from(env_path);
        match load_config_file(&env_path) {
            Ok(file_config) => config = file_config,
            Err(e) => warn!("Ignoring config from OQ_CONFIG: {e}"),
        }
    }

    // 2. Environment variables
    apply_env_overrides(&mut config);

    // 1. Explicit overrides
    apply_overrides(&mut config, overrides);

    Ok(config)
}

/// Load config from a TOML file
fn load_config_file(path: &Path) -> Result<QueueConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&contents).map_err(|e| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Apply environment variable overrides
fn apply_env_overrides(config: &mut QueueConfig) {
    if let Ok(name) = std::env::var("OQ_WORKER_NAME") {
        if !name.trim().is_empty() {
            config.worker.thread_name = name;
        }
    }

    if let Ok(value) = std::env::var("OQ_SYNC_WRITES") {
        match parse_bool(&value) {
            Some(sync) => config.file.sync_writes = sync,
            None => warn!("Ignoring invalid OQ_SYNC_WRITES value: {value:?}"),
        }
    }

    if let Some(retries) = std::env::var("OQ_LOCK_RETRIES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
    {
        config.file.lock_retries = retries;
    }

    if let Some(threshold) = std::env::var("OQ_COMPACT_THRESHOLD")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
    {
        config.file.compact_threshold = threshold;
    }
}

/// Apply explicit overrides
fn apply_overrides(config: &mut QueueConfig, overrides: &ConfigOverrides) {
    if let Some(ref name) = overrides.thread_name {
        config.worker.thread_name = name.clone();
    }

    if let Some(sync) = overrides.sync_writes {
        config.file.sync_writes = sync;
    }
}
