//! Error taxonomy shared by every council crate.
//!
//! `CouncilError` is the library-level error type returned by the orchestrator,
//! provider registry, schema transformer and artifact store. It mirrors the
//! taxonomy from the design notes: configuration, provider resolution,
//! transport, timeout, parse, and schema-validation errors, each carrying
//! enough context for the orchestrator to decide whether to fail, retry, or
//! degrade the run. Library code returns `CouncilError` and never calls
//! `std::process::exit`; the thin CLI shell maps it to an exit code.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CouncilError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("provider resolution error: {0}")]
    ProviderResolution(#[from] ProviderResolutionError),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("artifact store error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("run {run_id} is fatal: {reason}")]
    Fatal { run_id: String, reason: String },
}

/// Trait for providing user-friendly error reporting and a stable category,
/// used for metrics and for the CLI shell's exit-code mapping.
pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for grouping and metrics, matching §7 of the design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    ProviderResolution,
    Transport,
    Timeout,
    Parse,
    SchemaValidation,
    Fatal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::ProviderResolution => write!(f, "provider_resolution"),
            Self::Transport => write!(f, "transport"),
            Self::Timeout => write!(f, "timeout"),
            Self::Parse => write!(f, "parse"),
            Self::SchemaValidation => write!(f, "schema_validation"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

/// Configuration errors: missing API key, unknown role, unknown mode, invalid
/// reasoning budget, bad temperature. These fail a run immediately, before
/// any provider call is attempted.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing API key for provider '{provider}': set {env_var}")]
    MissingApiKey { provider: String, env_var: String },

    #[error("unknown role '{role}'")]
    UnknownRole { role: String },

    #[error("role '{role}' has no mode '{mode}'")]
    UnknownMode { role: String, mode: String },

    #[error("temperature {value} outside valid range [0.0, 2.0]")]
    InvalidTemperature { value: f32 },

    #[error("invalid reasoning budget for provider '{provider}': {reason}")]
    InvalidReasoningBudget { provider: String, reason: String },

    #[error("invalid configuration file {path}: {reason}")]
    InvalidFile { path: String, reason: String },

    #[error("configuration discovery failed: {reason}")]
    DiscoveryFailed { reason: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::MissingApiKey { provider, env_var } => {
                format!("provider '{provider}' requires environment variable {env_var}")
            }
            Self::UnknownRole { role } => format!("no role named '{role}' is registered"),
            Self::UnknownMode { role, mode } => {
                format!("role '{role}' does not support mode '{mode}'")
            }
            Self::InvalidTemperature { value } => {
                format!("temperature {value} must be between 0.0 and 2.0")
            }
            Self::InvalidReasoningBudget { provider, reason } => {
                format!("reasoning budget rejected by provider '{provider}': {reason}")
            }
            Self::InvalidFile { path, reason } => {
                format!("could not load configuration file {path}: {reason}")
            }
            Self::DiscoveryFailed { reason } => format!("configuration discovery failed: {reason}"),
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// A named provider could not be resolved to a registered adapter instance.
#[derive(Error, Debug)]
pub enum ProviderResolutionError {
    #[error("provider '{0}' is not registered")]
    NotRegistered(String),

    #[error(
        "no providers resolved for role '{role}' (preferred and fallback lists both empty or excluded)"
    )]
    NoProvidersResolved { role: String },
}

impl UserFriendlyError for ProviderResolutionError {
    fn user_message(&self) -> String {
        match self {
            Self::NotRegistered(name) => format!("provider '{name}' is not registered"),
            Self::NoProvidersResolved { role } => {
                format!("no providers could be resolved for role '{role}'")
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::ProviderResolution
    }
}

/// Per-provider failures surfaced from an adapter's `generate` call.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("[{provider}] transport error: {message}")]
    Transport { provider: String, message: String },

    #[error("[{provider}] request timed out after {duration:?}")]
    Timeout { provider: String, duration: Duration },

    #[error("[{provider}] response was not valid JSON: {reason}")]
    Parse { provider: String, reason: String },

    #[error("[{provider}] unsupported capability: {capability}")]
    Unsupported { provider: String, capability: String },
}

impl ProviderError {
    #[must_use]
    pub fn provider(&self) -> &str {
        match self {
            Self::Transport { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::Parse { provider, .. }
            | Self::Unsupported { provider, .. } => provider,
        }
    }
}

impl UserFriendlyError for ProviderError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport { .. } => ErrorCategory::Transport,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Parse { .. } => ErrorCategory::Parse,
            Self::Unsupported { .. } => ErrorCategory::Transport,
        }
    }
}

/// JSON Schema well-formedness and validation errors, surfaced to the
/// synthesis retry loop as a concise error list.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("schema reference '{0}' not found")]
    NotFound(String),

    #[error("schema is not valid JSON Schema: {0}")]
    InvalidSchema(String),

    #[error("response failed schema validation with {} error(s)", .errors.len())]
    ValidationFailed { errors: Vec<String> },
}

impl SchemaError {
    #[must_use]
    pub fn validation_errors(&self) -> &[String] {
        match self {
            Self::ValidationFailed { errors } => errors,
            _ => &[],
        }
    }
}

impl UserFriendlyError for SchemaError {
    fn user_message(&self) -> String {
        match self {
            Self::NotFound(name) => format!("schema '{name}' not found"),
            Self::InvalidSchema(reason) => format!("schema is malformed: {reason}"),
            Self::ValidationFailed { errors } => {
                format!("response failed validation: {}", errors.join("; "))
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::SchemaValidation
    }
}

/// Artifact store errors: path safety rejections, missing runs, or backing
/// storage failures.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("artifact path '{path}' escapes store root")]
    PathEscape { path: String },

    #[error("run '{run_id}' not found")]
    RunNotFound { run_id: String },

    #[error("artifact '{artifact_id}' not found")]
    ArtifactNotFound { artifact_id: String },

    #[error("artifact write failed at {path}: {reason}")]
    WriteFailed { path: String, reason: String },
}

impl UserFriendlyError for ArtifactError {
    fn user_message(&self) -> String {
        match self {
            Self::PathEscape { path } => format!("refusing to write outside store root: {path}"),
            Self::RunNotFound { run_id } => format!("no run found with id '{run_id}'"),
            Self::ArtifactNotFound { artifact_id } => {
                format!("no artifact found with id '{artifact_id}'")
            }
            Self::WriteFailed { path, reason } => {
                format!("could not write artifact at {path}: {reason}")
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Fatal
    }
}

impl CouncilError {
    /// A short, redaction-safe message suitable for `CouncilResult.errors`.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let message = match self {
            Self::Config(e) => e.user_message(),
            Self::ProviderResolution(e) => e.user_message(),
            Self::Provider(e) => e.user_message(),
            Self::Schema(e) => e.user_message(),
            Self::Artifact(e) => e.user_message(),
            Self::Io(e) => format!("IO error: {e}"),
            Self::Fatal { run_id, reason } => format!("run {run_id} failed: {reason}"),
        };
        council_redaction::redact_error_message(&message)
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(e) => e.category(),
            Self::ProviderResolution(e) => e.category(),
            Self::Provider(e) => e.category(),
            Self::Schema(e) => e.category(),
            Self::Artifact(e) => e.category(),
            Self::Io(_) => ErrorCategory::Fatal,
            Self::Fatal { .. } => ErrorCategory::Fatal,
        }
    }
}
