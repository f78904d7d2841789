//! Configuration module
//!
//! - types/mod.rs: Core configuration types (Config, ServerConfig, AuditConfig)
//! - types/sandbox.rs: Interpreter and resource limit configuration
//! - io.rs: Configuration loading and environment overrides
//! - validation.rs: Configuration validation
//! - paths.rs: Configuration file paths

mod io;
mod paths;
mod types;
mod validation;

pub use types::{AuditConfig, Config, ServerConfig};

pub use types::sandbox::{InterpreterConfig, InterpreterEnvNames, LimitsConfig};

pub use io::{
    apply_env_overrides, apply_overrides, config_to_toml, load_config_from_path,
    load_config_with,
};
pub use paths::{config_dir, config_path};
pub use validation::{validate_config, ConfigValidationResult, ValidationIssue};
