//! Sandbox configuration types
//!
//! Configuration for the external interpreter and the resource limits it
//! runs under.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// External interpreter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpreterConfig {
    /// Interpreter executable
    #[serde(default = "default_program")]
    pub program: PathBuf,
    /// Arguments passed before the source is fed on stdin
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Library directory handed to the interpreter
    #[serde(default = "default_library_path")]
    pub library_path: Option<PathBuf>,
    /// Environment variable names understood by the interpreter
    #[serde(default)]
    pub env_names: InterpreterEnvNames,
    /// Extra environment variables
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Working directory for the child process
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            program: default_program(),
            args: default_args(),
            library_path: default_library_path(),
            env_names: InterpreterEnvNames::default(),
            env: HashMap::new(),
            working_dir: None,
        }
    }
}

fn default_program() -> PathBuf {
    PathBuf::from("mnlroot/bin/mnlexec")
}

fn default_args() -> Vec<String> {
    vec!["/dev/stdin".to_string()]
}

fn default_library_path() -> Option<PathBuf> {
    Some(PathBuf::from("mnlroot/lib/manool"))
}

/// Names of the variables that carry the library path and memory budgets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterEnvNames {
    #[serde(default = "default_library_var")]
    pub library_path: String,
    #[serde(default = "default_stack_var")]
    pub stack: String,
    #[serde(default = "default_heap_var")]
    pub heap: String,
}

impl Default for InterpreterEnvNames {
    fn default() -> Self {
        InterpreterEnvNames {
            library_path: default_library_var(),
            stack: default_stack_var(),
            heap: default_heap_var(),
        }
    }
}

fn default_library_var() -> String {
    "MNL_PATH".to_string()
}

fn default_stack_var() -> String {
    "MNL_STACK".to_string()
}

fn default_heap_var() -> String {
    "MNL_HEAP".to_string()
}

/// Resource limits applied to every run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// CPU time ceiling enforced with RLIMIT_CPU
    #[serde(default = "default_cpu_time")]
    pub cpu_time_secs: u64,
    /// Wall-clock ceiling; defaults to the CPU limit plus a grace period
    #[serde(default, with = "humantime_serde")]
    pub wall_timeout: Option<Duration>,
    /// Stack budget in bytes
    #[serde(default = "default_stack")]
    pub stack_bytes: u64,
    /// Heap budget in bytes
    #[serde(default = "default_heap")]
    pub heap_bytes: u64,
    /// Optional RLIMIT_AS ceiling in bytes
    #[serde(default)]
    pub address_space_bytes: Option<u64>,
    /// Maximum captured output in bytes
    #[serde(default = "default_max_output")]
    pub max_output_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            cpu_time_secs: default_cpu_time(),
            wall_timeout: None,
            stack_bytes: default_stack(),
            heap_bytes: default_heap(),
            address_space_bytes: None,
            max_output_bytes: default_max_output(),
        }
    }
}

impl LimitsConfig {
    /// Grace period added on top of the CPU limit for the wall-clock timeout
    pub const WALL_GRACE: Duration = Duration::from_secs(5);

    /// Effective wall-clock timeout
    pub fn effective_wall_timeout(&self) -> Duration {
        self.wall_timeout
            .unwrap_or_else(|| Duration::from_secs(self.cpu_time_secs) + Self::WALL_GRACE)
    }
}

fn default_cpu_time() -> u64 {
    15
}

fn default_stack() -> u64 {
    4 * 1024 * 1024 // 4MB
}

fn default_heap() -> u64 {
    128 * 1024 * 1024 // 128MB
}

fn default_max_output() -> usize {
    1024 * 1024 // 1MB
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_default() {
        let limits = LimitsConfig::default();
        assert_eq!(limits.cpu_time_secs, 15);
        assert_eq!(limits.stack_bytes, 4 * 1024 * 1024);
        assert_eq!(limits.heap_bytes, 128 * 1024 * 1024);
        assert_eq!(limits.effective_wall_timeout(), Duration::from_secs(20));
    }

    #[test]
    fn test_wall_timeout_parsing() {
        let limits: LimitsConfig = toml::from_str(r#"wall_timeout = "2s 500ms""#).unwrap();
        assert_eq!(limits.effective_wall_timeout(), Duration::from_millis(2500));
        assert_eq!(limits.cpu_time_secs, 15);
    }

    #[test]
    fn test_interpreter_default() {
        let config = InterpreterConfig::default();
        assert_eq!(config.program, PathBuf::from("mnlroot/bin/mnlexec"));
        assert_eq!(config.args, vec!["/dev/stdin".to_string()]);
        assert_eq!(config.env_names.heap, "MNL_HEAP");
    }

    #[test]
    fn test_library_path_can_be_disabled() {
        let config: InterpreterConfig = json5::from_str("{ library_path: null }").unwrap();
        assert!(config.library_path.is_none());
    }
}
