//! Secure subprocess execution for CLI-backed provider adapters.
//!
//! Some provider adapters (e.g. a CLI wrapper around a locally-installed
//! model client) shell out to an external program rather than speaking
//! HTTP directly. Every such invocation goes through [`CommandSpec`] to
//! guarantee argv-style execution — no shell string evaluation, so argument
//! values can never be interpreted as shell syntax.

pub mod command_spec;
pub mod error;
pub mod process;

pub use command_spec::CommandSpec;
pub use error::RunnerError;
pub use process::{ProcessOutput, ProcessRunner, run_async};
