//! Whitelisted subprocess execution.

use outpost_common::{ExecutionRequest, ExecutionResult, OutpostError};
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

use super::ConfigStore;

/// Runs one OS process per request, gated by the live whitelist.
///
/// Each call:
/// - rejects blank or non-whitelisted commands before spawning anything
/// - spawns the executable directly (no shell) in its own process group
/// - captures stdout/stderr in full, decoding lossily
/// - kills and reaps the process group when the timeout expires
#[derive(Clone, Debug)]
pub struct CommandExecutor {
    store: ConfigStore,
}

impl CommandExecutor {
    pub fn new(store: ConfigStore) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        request: ExecutionRequest,
    ) -> Result<ExecutionResult, OutpostError> {
        if request.command.trim().is_empty() {
            return Err(OutpostError::EmptyCommand);
        }

        // The snapshot governs this call even if the config changes mid-run.
        let config = self.store.read().await;
        if !config.allows(&request.command) {
            tracing::warn!(command = %request.command, "Rejected non-whitelisted command");
            return Err(OutpostError::NotWhitelisted(request.command));
        }
        let limit = config.timeout();

        tracing::info!(
            command = %request.command,
            args = ?request.args,
            timeout = ?limit,
            "Executing command"
        );

        let start = Instant::now();
        let mut child = spawn(&request)?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let outcome = tokio::time::timeout(limit, async {
            tokio::try_join!(child.wait(), drain(stdout), drain(stderr))
        })
        .await;

        let (status, stdout, stderr) = match outcome {
            Ok(Ok(captured)) => captured,
            Ok(Err(e)) => {
                tracing::error!(command = %request.command, error = %e, "Execution failed");
                terminate(&mut child).await;
                return Err(OutpostError::execution_failure(&e));
            }
            Err(_) => {
                terminate(&mut child).await;
                tracing::warn!(
                    command = %request.command,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Command timed out, process group killed"
                );
                return Err(OutpostError::ExecutionTimeout {
                    timeout_secs: config.command_timeout(),
                });
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = exit_code(status);

        tracing::info!(
            command = %request.command,
            exit_code,
            duration_ms,
            "Command completed"
        );

        Ok(ExecutionResult {
            command: request.command,
            args: request.args,
            exit_code,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            duration_ms,
        })
    }
}

fn spawn(request: &ExecutionRequest) -> Result<Child, OutpostError> {
    let mut command = Command::new(&request.command);
    command
        .args(&request.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(unix)]
    command.process_group(0);

    command.spawn().map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => OutpostError::CommandNotFound(request.command.clone()),
        _ => {
            tracing::error!(command = %request.command, error = %e, "Failed to spawn command");
            OutpostError::execution_failure(&e)
        }
    })
}

/// Read a pipe to EOF; a missing pipe yields no output.
async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// SIGKILL the child's process group, then kill and reap the child itself.
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::errno::Errno;
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        if let Some(pid) = child.id() {
            // ESRCH just means the group is already gone
            match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                Ok(()) | Err(Errno::ESRCH) => {}
                Err(e) => tracing::warn!(pid, error = %e, "Failed to kill process group"),
            }
        }
    }

    if let Err(e) = child.kill().await {
        tracing::warn!(error = %e, "Failed to reap killed process");
    }
}

/// Exit code, or the negated signal number for signal-terminated processes
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }

    -1
}
