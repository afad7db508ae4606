//! Configuration management for council.
//!
//! Hierarchical configuration with discovery and precedence: environment
//! variables > config file > built-in defaults. Supports a TOML file with a
//! `[store]` section and a `[roles.<name>]` table per role.

pub mod discovery;
pub mod model;
pub mod validation;

pub use model::{
    CouncilConfig, ModeConfig, ProviderSelection, ReasoningConfig, RoleConfig, StoreConfig,
};
