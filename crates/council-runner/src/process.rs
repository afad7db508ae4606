use crate::error::RunnerError;
use std::time::Duration;

use super::CommandSpec;

/// Output from a process execution.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl ProcessOutput {
    #[must_use]
    pub fn new(stdout: Vec<u8>, stderr: Vec<u8>, exit_code: Option<i32>, timed_out: bool) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
            timed_out,
        }
    }

    #[must_use]
    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    #[must_use]
    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0) && !self.timed_out
    }
}

/// Trait for synchronous process execution.
///
/// Implementations MUST use argv-style APIs only (no shell string
/// evaluation) and MUST NOT expose async in the public API; they may drive
/// an async runtime internally to enforce the timeout.
pub trait ProcessRunner {
    fn run(&self, cmd: &CommandSpec, timeout: Duration) -> Result<ProcessOutput, RunnerError>;
}

/// Run a `CommandSpec` asynchronously, killing the child and returning a
/// timed-out output if it doesn't finish within `timeout`.
///
/// This is what the CLI-backed provider adapter (`claude_code_cli`) uses:
/// the orchestrator already runs inside a Tokio runtime, so provider calls
/// should never block a worker thread on a child process.
pub async fn run_async(
    cmd: &CommandSpec,
    timeout: Duration,
) -> Result<ProcessOutput, RunnerError> {
    let program = cmd.program.to_string_lossy().to_string();
    let mut child = cmd
        .to_tokio_command()
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RunnerError::ProgramNotFound {
                    program: program.clone(),
                }
            } else {
                RunnerError::SpawnFailed {
                    program: program.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) if output.status.success() => Ok(ProcessOutput::new(
            output.stdout,
            output.stderr,
            output.status.code(),
            false,
        )),
        Ok(Ok(output)) => Err(RunnerError::NonZeroExit {
            program,
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }),
        Ok(Err(e)) => Err(RunnerError::SpawnFailed {
            program,
            reason: e.to_string(),
        }),
        Err(_elapsed) => Err(RunnerError::Timeout {
            program,
            timeout_seconds: timeout.as_secs(),
        }),
    }
}
