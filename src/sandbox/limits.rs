//! Resource limits for the interpreter process
//!
//! | Limit | Mechanism |
//! |-------|-----------|
//! | CPU time | `RLIMIT_CPU`, soft = limit, hard = limit + 1 |
//! | Core dumps | `RLIMIT_CORE` = 0 |
//! | Address space | `RLIMIT_AS`, only when configured |
//! | Wall clock | killed by the runner |
//! | Stack / heap | budgets passed to the interpreter via its environment |
//!
//! The soft CPU limit delivers SIGXCPU; the hard limit one second later
//! guarantees a SIGKILL if the interpreter ignores it.

use std::time::Duration;
use tokio::process::Command;

use crate::config::LimitsConfig;

/// Limits applied to one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    pub cpu_time_secs: u64,
    pub wall_timeout: Duration,
    pub address_space_bytes: Option<u64>,
    pub max_output_bytes: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        ResourceLimits::from(&LimitsConfig::default())
    }
}

impl From<&LimitsConfig> for ResourceLimits {
    fn from(config: &LimitsConfig) -> Self {
        ResourceLimits {
            cpu_time_secs: config.cpu_time_secs,
            wall_timeout: config.effective_wall_timeout(),
            address_space_bytes: config.address_space_bytes,
            max_output_bytes: config.max_output_bytes,
        }
    }
}

impl ResourceLimits {
    pub fn with_cpu_time(mut self, secs: u64) -> Self {
        self.cpu_time_secs = secs;
        self
    }

    pub fn with_wall_timeout(mut self, timeout: Duration) -> Self {
        self.wall_timeout = timeout;
        self
    }

    pub fn with_max_output(mut self, bytes: usize) -> Self {
        self.max_output_bytes = bytes;
        self
    }
}

/// Install the OS limits in the child and merge its stderr into stdout.
///
/// Must be called after stdout has been configured as a pipe: the merge
/// duplicates whatever fd 1 is at exec time onto fd 2.
#[cfg(unix)]
pub(super) fn apply_unix_limits(cmd: &mut Command, limits: &ResourceLimits) {
    let cpu = limits.cpu_time_secs as libc::rlim_t;
    let address_space = limits.address_space_bytes.map(|b| b as libc::rlim_t);

    // SAFETY: pre_exec runs between fork() and exec() in the child. The
    // closure only calls async-signal-safe functions (setrlimit, dup2) on
    // Copy values moved into it; the parent is not affected.
    unsafe {
        cmd.pre_exec(move || {
            set_rlimit(libc::RLIMIT_CPU, cpu, cpu.saturating_add(1))?;
            set_rlimit(libc::RLIMIT_CORE, 0, 0)?;
            if let Some(bytes) = address_space {
                set_rlimit(libc::RLIMIT_AS, bytes, bytes)?;
            }
            if libc::dup2(libc::STDOUT_FILENO, libc::STDERR_FILENO) == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(unix)]
fn set_rlimit(
    resource: RlimitResource,
    soft: libc::rlim_t,
    hard: libc::rlim_t,
) -> std::io::Result<()> {
    let mut current = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: current is a valid out-pointer and resource a valid constant.
    if unsafe { libc::getrlimit(resource, &mut current) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    // An unprivileged process cannot raise its hard limit
    let hard = hard.min(current.rlim_max);
    let rlim = libc::rlimit {
        rlim_cur: soft.min(hard),
        rlim_max: hard,
    };
    // SAFETY: rlim is a valid rlimit and resource a valid constant.
    if unsafe { libc::setrlimit(resource, &rlim) } != 0 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

#[cfg(all(unix, target_os = "linux", target_env = "gnu"))]
type RlimitResource = libc::__rlimit_resource_t;

#[cfg(all(unix, not(all(target_os = "linux", target_env = "gnu"))))]
type RlimitResource = libc::c_int;

/// No-op for non-Unix platforms
#[cfg(not(unix))]
pub(super) fn apply_unix_limits(_cmd: &mut Command, _limits: &ResourceLimits) {}
