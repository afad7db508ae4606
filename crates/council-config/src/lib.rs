//! Role, provider and reasoning configuration: the TOML file format, file
//! discovery, environment variable overrides, and validation.
//!
//! A council deployment is configured by a `council.toml` file plus a small
//! set of environment variables. The file declares *roles* (critic, drafter,
//! synthesizer, ...), each with a provider preference list, a model pack, and
//! a reasoning-effort setting; environment variables layer API keys and
//! quick model overrides on top without touching the file.

pub mod config;

pub use config::discovery::discover;
pub use config::model::{
    CouncilConfig, ModeConfig, ProviderSelection, ReasoningConfig, RoleConfig, StoreConfig,
};
