//! Error types for CLI-backed provider execution.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("{program} not found on PATH")]
    ProgramNotFound { program: String },

    #[error("failed to spawn {program}: {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("{program} exited with status {code:?}: {stderr}")]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{program} timed out after {timeout_seconds} seconds")]
    Timeout { program: String, timeout_seconds: u64 },

    #[error("{program} produced output that was not valid UTF-8")]
    InvalidUtf8Output { program: String },
}
