//! Structured logging setup shared by the facade and the thin CLI.
//!
//! Council emits one tracing span per phase (`draft`, `critique`,
//! `synthesis`) tagged with the run id, so a single run's log lines can be
//! grepped out of a multi-run process. Error messages are redacted before
//! they reach the log sink so API keys never show up in stderr.

use std::io::IsTerminal;
use tracing::{Level, error, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Returns true when colored output is appropriate: stdout is a TTY and
/// `NO_COLOR` is unset.
#[must_use]
pub fn use_color() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Initialize the global tracing subscriber.
///
/// `verbose` switches the default filter from `council=info,warn` to
/// `council=debug,info` and adds span-close events; `RUST_LOG` always takes
/// precedence when set.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("council=debug,info")
            } else {
                EnvFilter::try_new("council=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let layer = fmt::layer()
        .with_target(verbose)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_span_events(if verbose {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        })
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .try_init()?;

    Ok(())
}

/// Open a span for one orchestration phase of one run.
#[must_use]
pub fn phase_span(run_id: &str, phase: &str) -> tracing::Span {
    span!(Level::INFO, "phase", run_id = %run_id, phase = %phase)
}

/// Log a phase failure with the error message redacted first.
pub fn log_phase_error(run_id: &str, phase: &str, error_message: &str) {
    let redacted = council_redaction::redact_error_message(error_message);
    error!(run_id = %run_id, phase = %phase, error = %redacted, "phase failed");
}

/// Log a clamp/degradation warning for the result's log trail.
pub fn log_warning(run_id: &str, message: &str) {
    info!(run_id = %run_id, warning = %message, "council warning");
}
