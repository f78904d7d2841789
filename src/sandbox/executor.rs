//! Common runner trait and types

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{InterpreterConfig, LimitsConfig};
use crate::error::Result;
use crate::sandbox::limits::ResourceLimits;

/// Exit status reported when the interpreter could not be started
pub const SPAWN_FAILURE_STATUS: i32 = 127;

/// Request to run one snippet through the interpreter
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Source text, fed on stdin
    pub source: String,
    /// Interpreter executable
    pub program: PathBuf,
    /// Interpreter arguments
    pub args: Vec<String>,
    /// Environment variables
    pub env: HashMap<String, String>,
    /// Working directory
    pub working_dir: Option<PathBuf>,
    /// Limits enforced on the child
    pub limits: ResourceLimits,
}

impl RunRequest {
    /// Create a request with default limits and no arguments
    pub fn new(source: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        RunRequest {
            source: source.into(),
            program: program.into(),
            args: Vec::new(),
            env: HashMap::new(),
            working_dir: None,
            limits: ResourceLimits::default(),
        }
    }

    /// Build a request from the interpreter and limits configuration.
    ///
    /// The library path and the stack/heap budgets are passed to the
    /// interpreter through the configured environment variable names.
    pub fn from_config(
        source: impl Into<String>,
        interpreter: &InterpreterConfig,
        limits: &LimitsConfig,
    ) -> Self {
        let names = &interpreter.env_names;
        let mut request = RunRequest::new(source, interpreter.program.clone())
            .with_args(interpreter.args.iter().cloned())
            .with_limits(ResourceLimits::from(limits));

        for (key, value) in &interpreter.env {
            request = request.with_env(key.clone(), value.clone());
        }
        if let Some(lib) = &interpreter.library_path {
            request = request.with_env(names.library_path.clone(), lib.display().to_string());
        }
        request = request
            .with_env(names.stack.clone(), limits.stack_bytes.to_string())
            .with_env(names.heap.clone(), limits.heap_bytes.to_string());

        request.working_dir = interpreter.working_dir.clone();
        request
    }

    /// Append arguments
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set limits
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// How the interpreter process ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Exited on its own with a code
    Exited(i32),
    /// Killed by a signal (including SIGXCPU from the CPU limit)
    Signaled(i32),
    /// Killed after the wall-clock timeout
    TimedOut,
    /// Never started
    SpawnFailed(String),
}

impl Termination {
    /// Shell-style exit status, `None` on success.
    ///
    /// Signals map to `128 + signal` and a failed start to 127, matching
    /// what a POSIX shell reports in `$?`.
    pub fn exit_status(&self) -> Option<i32> {
        match self {
            Termination::Exited(0) => None,
            Termination::Exited(code) => Some(*code),
            Termination::Signaled(signal) => Some(128 + signal),
            Termination::TimedOut => Some(128 + libc::SIGKILL),
            Termination::SpawnFailed(_) => Some(SPAWN_FAILURE_STATUS),
        }
    }

    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Termination::Exited(0) => "success",
            Termination::Exited(_) => "exit",
            Termination::Signaled(signal) if *signal == libc::SIGXCPU => "cpu-limit",
            Termination::Signaled(_) => "signal",
            Termination::TimedOut => "timeout",
            Termination::SpawnFailed(_) => "spawn-failed",
        }
    }
}

/// Result of running a snippet
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Combined stdout and stderr, in the order the child wrote them
    pub output: String,
    /// How the process ended
    pub termination: Termination,
    /// Output hit the capture cap
    pub truncated: bool,
    /// Wall time from spawn to exit
    pub elapsed: Duration,
}

impl RunOutcome {
    /// Outcome for an interpreter that could not be started
    pub fn spawn_failed(reason: impl Into<String>) -> Self {
        RunOutcome {
            output: String::new(),
            termination: Termination::SpawnFailed(reason.into()),
            truncated: false,
            elapsed: Duration::ZERO,
        }
    }

    pub fn success(&self) -> bool {
        self.termination.exit_status().is_none()
    }
}

/// Trait for snippet execution backends
#[async_trait]
pub trait SnippetRunner: Send + Sync {
    /// Get the runner name
    fn name(&self) -> &str;

    /// Run a snippet.
    ///
    /// A process that fails, crashes, times out or never starts still
    /// produces an outcome; errors are reserved for the runner itself.
    async fn run(&self, request: RunRequest) -> Result<RunOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_status_mapping() {
        assert_eq!(Termination::Exited(0).exit_status(), None);
        assert_eq!(Termination::Exited(3).exit_status(), Some(3));
        assert_eq!(Termination::Signaled(libc::SIGXCPU).exit_status(), Some(152));
        assert_eq!(Termination::TimedOut.exit_status(), Some(137));
        assert_eq!(
            Termination::SpawnFailed("nope".into()).exit_status(),
            Some(SPAWN_FAILURE_STATUS)
        );
    }

    #[test]
    fn test_termination_kind() {
        assert_eq!(Termination::Signaled(libc::SIGXCPU).kind(), "cpu-limit");
        assert_eq!(Termination::Signaled(libc::SIGSEGV).kind(), "signal");
        assert_eq!(Termination::Exited(1).kind(), "exit");
    }

    #[test]
    fn test_request_from_config() {
        let interpreter = InterpreterConfig::default();
        let limits = LimitsConfig::default();
        let req = RunRequest::from_config("print 1", &interpreter, &limits);

        assert_eq!(req.source, "print 1");
        assert_eq!(req.program, interpreter.program);
        assert_eq!(req.args, vec!["/dev/stdin".to_string()]);
        assert_eq!(req.env.get("MNL_PATH").map(String::as_str), Some("mnlroot/lib/manool"));
        assert_eq!(req.env.get("MNL_STACK").map(String::as_str), Some("4194304"));
        assert_eq!(req.env.get("MNL_HEAP").map(String::as_str), Some("134217728"));
        assert_eq!(req.limits.cpu_time_secs, 15);
    }

    #[test]
    fn test_request_without_library_path() {
        let interpreter = InterpreterConfig {
            library_path: None,
            ..InterpreterConfig::default()
        };
        let req = RunRequest::from_config("", &interpreter, &LimitsConfig::default());
        assert!(!req.env.contains_key("MNL_PATH"));
    }

    #[test]
    fn test_spawn_failed_outcome() {
        let outcome = RunOutcome::spawn_failed("No such file or directory");
        assert!(!outcome.success());
        assert_eq!(outcome.termination.kind(), "spawn-failed");
    }
}
