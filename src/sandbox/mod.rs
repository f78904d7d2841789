//! Sandbox module - Resource-limited snippet execution
//!
//! - executor.rs: `SnippetRunner` trait, requests and outcomes
//! - interpreter.rs: child-process runner for the external interpreter
//! - limits.rs: OS resource limits installed in the child

mod executor;
mod interpreter;
mod limits;

pub use executor::{RunOutcome, RunRequest, SnippetRunner, Termination, SPAWN_FAILURE_STATUS};
pub use interpreter::InterpreterRunner;
pub use limits::ResourceLimits;
