//! Configuration validation
//!
//! Validates configuration and reports issues.

use super::types::Config;

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    result = validate_interpreter_config(config, result);
    result = validate_limits_config(config, result);
    result = validate_audit_config(config, result);

    result
}

fn validate_interpreter_config(
    config: &Config,
    mut result: ConfigValidationResult,
) -> ConfigValidationResult {
    let program = &config.interpreter.program;

    if program.as_os_str().is_empty() {
        return result.with_error(
            ValidationIssue::new("interpreter.program", "No interpreter configured")
                .with_suggestion("Set interpreter.program or EVALD_INTERPRETER"),
        );
    }

    // Bare names are looked up in PATH, anything else relative to the cwd
    let found = if program.components().count() == 1 {
        which::which(program).is_ok()
    } else {
        program.is_file()
    };

    if !found {
        result = result.with_warning(
            ValidationIssue::new(
                "interpreter.program",
                format!("Interpreter not found: {}", program.display()),
            )
            .with_suggestion("Every submission will report a failed start until it is installed"),
        );
    }

    if let Some(lib) = &config.interpreter.library_path {
        if !lib.is_dir() {
            result = result.with_warning(ValidationIssue::new(
                "interpreter.library_path",
                format!("Library directory does not exist: {}", lib.display()),
            ));
        }
    }

    result
}

fn validate_limits_config(
    config: &Config,
    mut result: ConfigValidationResult,
) -> ConfigValidationResult {
    let limits = &config.limits;

    if limits.cpu_time_secs == 0 {
        result = result.with_error(
            ValidationIssue::new("limits.cpu_time_secs", "CPU time limit must be positive")
                .with_suggestion("Use at least 1 second"),
        );
    }

    if limits.max_output_bytes == 0 {
        result = result.with_error(ValidationIssue::new(
            "limits.max_output_bytes",
            "Output cap must be positive",
        ));
    }

    if limits.effective_wall_timeout().is_zero() {
        result = result.with_error(ValidationIssue::new(
            "limits.wall_timeout",
            "Wall-clock timeout must be positive",
        ));
    } else if limits.effective_wall_timeout().as_secs() < limits.cpu_time_secs {
        result = result.with_warning(ValidationIssue::new(
            "limits.wall_timeout",
            "Wall-clock timeout is shorter than the CPU limit; runs will be killed early",
        ));
    }

    result
}

fn validate_audit_config(
    config: &Config,
    mut result: ConfigValidationResult,
) -> ConfigValidationResult {
    if !config.audit.enabled {
        return result;
    }

    let parent = config
        .audit
        .path
        .parent()
        .filter(|p| !p.as_os_str().is_empty());

    if let Some(dir) = parent {
        if !dir.is_dir() {
            result = result.with_warning(
                ValidationIssue::new(
                    "audit.path",
                    format!("Audit log directory does not exist: {}", dir.display()),
                )
                .with_suggestion("Create the directory or change audit.path"),
            );
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        let result = validate_config(&config);

        // The default interpreter is usually absent; that is only a warning
        assert!(result.errors.is_empty());
        assert!(result.valid);
    }

    #[test]
    fn test_zero_limits_are_errors() {
        let mut config = Config::default();
        config.limits.cpu_time_secs = 0;
        config.limits.max_output_bytes = 0;

        let result = validate_config(&config);
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_empty_program_is_error() {
        let mut config = Config::default();
        config.interpreter.program = PathBuf::new();

        let result = validate_config(&config);
        assert!(!result.valid);
        assert_eq!(result.errors[0].path, "interpreter.program");
    }

    #[test]
    fn test_short_wall_timeout_warns() {
        let mut config = Config::default();
        config.interpreter.program = PathBuf::from("sh");
        config.interpreter.library_path = None;
        config.limits.wall_timeout = Some(Duration::from_secs(1));

        let result = validate_config(&config);
        assert!(result.valid);
        assert!(result.warnings.iter().any(|w| w.path == "limits.wall_timeout"));
    }

    #[test]
    fn test_missing_audit_dir_warns() {
        let mut config = Config::default();
        config.audit.path = PathBuf::from("/nonexistent/dir/eval.log");

        let result = validate_config(&config);
        assert!(result.warnings.iter().any(|w| w.path == "audit.path"));
    }
}
