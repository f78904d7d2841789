//! Configuration I/O - Loading and rendering configuration
//!
//! Handles reading configuration from files and environment variables.

use std::path::{Path, PathBuf};

use super::types::Config;
use crate::error::{Error, Result};

/// Load configuration with layered precedence:
/// 1. The file at `path`, else the default config file if it exists,
///    otherwise defaults
/// 2. Environment variable overrides (includes .env)
///
/// An explicitly given path must exist; the default path is optional.
pub fn load_config_with(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => load_config_from_path(path)?,
        None => {
            let config_path = super::paths::config_path();
            if config_path.exists() {
                load_config_from_path(&config_path)?
            } else {
                Config::default()
            }
        }
    };

    // Environment has the highest precedence
    apply_env_overrides(&mut config);

    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    // Detect format by extension
    let config: Config = if path.extension().is_some_and(|ext| ext == "json" || ext == "json5") {
        json5::from_str(&content).map_err(|e| Error::Config(format!("Invalid JSON config: {}", e)))?
    } else if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))?
    } else {
        // Try TOML first, then JSON5
        toml::from_str(&content)
            .map_err(Error::from)
            .or_else(|_| json5::from_str(&content).map_err(Error::from))
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?
    };

    Ok(config)
}

/// Apply environment variable overrides to an existing config.
///
/// Loads `.env` if present, then overlays any set variables.
pub fn apply_env_overrides(config: &mut Config) {
    dotenvy::dotenv().ok();
    apply_overrides(config, |key| std::env::var(key).ok());
}

/// Apply overrides from an arbitrary variable source
pub fn apply_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // Server overrides
    if let Some(bind) = lookup("EVALD_BIND") {
        config.server.bind = bind;
    }
    if let Some(port) = lookup("EVALD_PORT").and_then(|v| v.parse().ok()) {
        config.server.port = port;
    }

    // Interpreter overrides
    if let Some(program) = lookup("EVALD_INTERPRETER") {
        config.interpreter.program = PathBuf::from(program);
    }
    if let Some(lib) = lookup("EVALD_LIBRARY_PATH") {
        config.interpreter.library_path = if lib.is_empty() {
            None
        } else {
            Some(PathBuf::from(lib))
        };
    }

    // Limit overrides
    if let Some(secs) = lookup("EVALD_CPU_TIME_SECS").and_then(|v| v.parse().ok()) {
        config.limits.cpu_time_secs = secs;
    }
    if let Some(bytes) = lookup("EVALD_STACK_BYTES").and_then(|v| v.parse().ok()) {
        config.limits.stack_bytes = bytes;
    }
    if let Some(bytes) = lookup("EVALD_HEAP_BYTES").and_then(|v| v.parse().ok()) {
        config.limits.heap_bytes = bytes;
    }

    // Audit overrides
    if let Some(path) = lookup("EVALD_AUDIT_LOG") {
        if path.is_empty() {
            config.audit.enabled = false;
        } else {
            config.audit.path = PathBuf::from(path);
        }
    }
}

/// Render the effective configuration as TOML
pub fn config_to_toml(config: &Config) -> Result<String> {
    toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
}
