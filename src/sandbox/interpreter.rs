//! External interpreter execution
//!
//! Spawns the interpreter as a child process under OS resource limits,
//! feeds it the source on stdin and captures stdout with stderr merged in.

use async_trait::async_trait;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::process::{ExitStatus, Stdio};
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::sandbox::executor::{RunOutcome, RunRequest, SnippetRunner, Termination};
use crate::sandbox::limits::apply_unix_limits;

const READ_CHUNK: usize = 8 * 1024;

/// Runs snippets through an external interpreter binary
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpreterRunner;

impl InterpreterRunner {
    pub fn new() -> Self {
        InterpreterRunner
    }
}

#[async_trait]
impl SnippetRunner for InterpreterRunner {
    fn name(&self) -> &str {
        "interpreter"
    }

    async fn run(&self, request: RunRequest) -> Result<RunOutcome> {
        let limits = request.limits;

        let mut command = Command::new(&request.program);
        command
            .args(&request.args)
            .envs(&request.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            // Replaced by the stdout pipe in the child
            .stderr(Stdio::null())
            .kill_on_drop(true);

        // Own process group so helpers the interpreter starts die with it
        #[cfg(unix)]
        command.process_group(0);

        if let Some(dir) = &request.working_dir {
            command.current_dir(dir);
        }

        apply_unix_limits(&mut command, &limits);

        debug!(
            program = %request.program.display(),
            cpu_time_secs = limits.cpu_time_secs,
            wall_timeout = ?limits.wall_timeout,
            "Spawning interpreter"
        );

        let start = Instant::now();

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(program = %request.program.display(), error = %e, "Failed to spawn interpreter");
                return Ok(RunOutcome::spawn_failed(format!(
                    "cannot run {}: {}",
                    request.program.display(),
                    e
                )));
            }
        };

        // Kills the group on drop, including when this future is cancelled
        let group = GroupKill::new(&child);

        // Feed stdin from its own task so a large source cannot deadlock
        // against a full stdout pipe.
        let writer = child.stdin.take().map(|mut stdin| {
            let source = request.source;
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(source.as_bytes()).await {
                    // The interpreter may exit without reading everything
                    if e.kind() != std::io::ErrorKind::BrokenPipe {
                        debug!(error = %e, "Failed to write interpreter stdin");
                    }
                }
            })
        });

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Sandbox("Interpreter stdout was not captured".to_string()))?;

        let mut buf = Vec::new();
        let collected = tokio::time::timeout(limits.wall_timeout, async {
            let truncated = read_capped(&mut stdout, &mut buf, limits.max_output_bytes).await?;
            if truncated {
                group.kill_or(&mut child);
            }
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, truncated))
        })
        .await;

        if let Some(writer) = writer {
            writer.abort();
        }

        let (termination, truncated) = match collected {
            Ok(Ok((status, truncated))) => (termination_from_status(status), truncated),
            Ok(Err(e)) => {
                group.kill_or(&mut child);
                return Err(Error::Sandbox(format!("Process error: {}", e)));
            }
            Err(_) => {
                warn!("Interpreter exceeded wall-clock timeout of {:?}", limits.wall_timeout);
                group.kill_or(&mut child);
                child.wait().await.ok();
                (Termination::TimedOut, false)
            }
        };

        let outcome = RunOutcome {
            output: String::from_utf8_lossy(&buf).into_owned(),
            termination,
            truncated,
            elapsed: start.elapsed(),
        };

        info!(
            kind = outcome.termination.kind(),
            exit_status = ?outcome.termination.exit_status(),
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            output_bytes = buf.len(),
            truncated = outcome.truncated,
            "Interpreter run finished"
        );

        Ok(outcome)
    }
}

/// Read until EOF or until `limit` bytes are buffered.
///
/// Returns `true` if the reader had more data than fits.
async fn read_capped<R>(reader: &mut R, buf: &mut Vec<u8>, limit: usize) -> std::io::Result<bool>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(false);
        }
        let room = limit.saturating_sub(buf.len());
        if n > room {
            buf.extend_from_slice(&chunk[..room]);
            return Ok(true);
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

/// SIGKILLs the child's process group when dropped.
///
/// The group id is the child's pid (`process_group(0)` at spawn).
struct GroupKill {
    pgid: Option<Pid>,
}

impl GroupKill {
    fn new(child: &Child) -> Self {
        let pgid = child
            .id()
            .and_then(|pid| i32::try_from(pid).ok())
            .map(Pid::from_raw);
        GroupKill { pgid }
    }

    /// Returns `false` if the group could not be signalled.
    fn kill(&self) -> bool {
        match self.pgid {
            Some(pgid) => killpg(pgid, Signal::SIGKILL).is_ok(),
            None => false,
        }
    }

    /// Kill the group, falling back to the child alone
    fn kill_or(&self, child: &mut Child) {
        if !self.kill() {
            child.start_kill().ok();
        }
    }
}

impl Drop for GroupKill {
    fn drop(&mut self) {
        self.kill();
    }
}

fn termination_from_status(status: ExitStatus) -> Termination {
    if let Some(code) = status.code() {
        return Termination::Exited(code);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Termination::Signaled(signal);
        }
    }

    Termination::Exited(-1)
}
