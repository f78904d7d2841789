//! Configuration types module

pub mod sandbox;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// External interpreter configuration
    #[serde(default)]
    pub interpreter: sandbox::InterpreterConfig,

    /// Resource limits for each run
    #[serde(default)]
    pub limits: sandbox::LimitsConfig,

    /// Submission audit log configuration
    #[serde(default)]
    pub audit: AuditConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Largest accepted request body
    #[serde(default = "default_max_request")]
    pub max_request_bytes: usize,
    /// Title of the rendered output page
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
            bind: default_bind(),
            max_request_bytes: default_max_request(),
            title: default_title(),
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_max_request() -> usize {
    256 * 1024 // 256KB
}

fn default_title() -> String {
    "Online Evaluator Output".to_string()
}

/// Submission audit log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Record submissions
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Append-only log file
    #[serde(default = "default_audit_path")]
    pub path: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        AuditConfig {
            enabled: true,
            path: default_audit_path(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_audit_path() -> PathBuf {
    PathBuf::from("eval.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert!(config.audit.enabled);
        assert_eq!(config.audit.path, PathBuf::from("eval.log"));
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9000

            [limits]
            cpu_time_secs = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.limits.cpu_time_secs, 3);
        assert_eq!(config.limits.heap_bytes, 128 * 1024 * 1024);
    }
}
