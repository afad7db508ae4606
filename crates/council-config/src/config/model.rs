use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default temperature applied to a role when neither the role nor its mode
/// sets one explicitly.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Top-level configuration loaded from `council.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CouncilConfig {
    /// Artifact store location.
    #[serde(default)]
    pub store: StoreConfig,
    /// Named model packs: a model pack maps a provider name to the model id
    /// to use for that provider, so a role can say `model_pack = "fast"`
    /// instead of repeating provider/model pairs.
    #[serde(default)]
    pub model_packs: HashMap<String, HashMap<String, String>>,
    /// Role definitions, keyed by role name (e.g. "drafter", "critic").
    #[serde(default)]
    pub roles: HashMap<String, RoleConfig>,
    /// Directory containing one canonical JSON Schema file per role,
    /// named `<role>.json` (§6 "Schema files... indexed by role name").
    /// Defaults to `<COUNCIL_HOME>/schemas` when unset.
    pub schema_dir: Option<String>,
}

/// Artifact store configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Root directory for the content-addressed blob store and run ledger.
    /// Defaults to `<COUNCIL_HOME>/runs` when unset.
    pub root: Option<String>,
    /// Maximum age, in days, a run's artifacts are kept before the stale-run
    /// sweep removes them. `None` disables the sweep.
    pub retention_days: Option<u32>,
}

/// A single role's configuration: which providers it can run on, which
/// model pack it uses, its reasoning settings, and its system prompt.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoleConfig {
    /// Human-readable display name; defaults to the role's config key.
    pub name: Option<String>,
    /// Name of a `[model_packs.<name>]` table to resolve provider -> model
    /// id from. Mutually layered with `models`: explicit `models` entries
    /// take precedence over the pack's.
    pub model_pack: Option<String>,
    /// Per-provider model id overrides, layered on top of `model_pack`.
    #[serde(default)]
    pub models: HashMap<String, String>,
    /// Provider resolution preferences for this role.
    #[serde(default)]
    pub providers: ProviderSelection,
    /// Reasoning/thinking configuration for this role.
    #[serde(default)]
    pub reasoning: ReasoningConfig,
    /// Sampling temperature, 0.0-2.0.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Base system prompt. The deliberation protocol text is appended by
    /// the role registry, not stored here.
    #[serde(default)]
    pub system_prompt: String,
    /// Named prompt variants layered on top of `system_prompt`.
    #[serde(default)]
    pub modes: HashMap<String, ModeConfig>,
    /// Name of the JSON Schema this role's synthesis output must validate
    /// against, resolved by the schema transformer.
    pub schema: Option<String>,
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

/// Provider preference list for a role.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderSelection {
    /// Providers to try first, in order.
    #[serde(default)]
    pub preferred: Vec<String>,
    /// Providers to fall back to if all preferred providers fail or are
    /// excluded.
    #[serde(default)]
    pub fallback: Vec<String>,
    /// Providers never to use for this role, even if listed above.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// When true, resolution fails if no preferred provider is available
    /// rather than falling back.
    #[serde(default)]
    pub strict: bool,
}

/// Reasoning/thinking-budget configuration for a role.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReasoningConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Effort style for providers with a discrete effort enum (e.g.
    /// "low" | "medium" | "high").
    pub effort: Option<String>,
    /// Explicit reasoning token budget for providers that take a numeric
    /// budget instead of (or in addition to) an effort enum.
    pub budget_tokens: Option<u32>,
    /// Thinking-level label for providers with a named-tier scheme.
    pub thinking_level: Option<String>,
}

/// A named prompt/parameter variant of a role.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModeConfig {
    /// Text appended to the role's base system prompt when this mode is
    /// selected.
    #[serde(default)]
    pub system_prompt_suffix: String,
    /// Optional temperature override for this mode.
    pub temperature: Option<f32>,
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            name: None,
            model_pack: None,
            models: HashMap::new(),
            providers: ProviderSelection::default(),
            reasoning: ReasoningConfig::default(),
            temperature: DEFAULT_TEMPERATURE,
            system_prompt: String::new(),
            modes: HashMap::new(),
            schema: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_config_defaults_temperature() {
        let toml_src = r#"
            system_prompt = "You are a critic."
        "#;
        let role: RoleConfig = toml::from_str(toml_src).unwrap();
        assert_eq!(role.temperature, DEFAULT_TEMPERATURE);
        assert!(role.providers.preferred.is_empty());
    }

    #[test]
    fn council_config_parses_roles_and_packs() {
        let toml_src = r#"
            [store]
            root = "/tmp/council-runs"

            [model_packs.fast]
            anthropic = "claude-haiku-4"
            openai = "gpt-5-mini"

            [roles.drafter]
            model_pack = "fast"
            system_prompt = "Draft a solution."

            [roles.drafter.providers]
            preferred = ["anthropic", "openai"]
        "#;
        let cfg: CouncilConfig = toml::from_str(toml_src).unwrap();
        assert_eq!(cfg.store.root.as_deref(), Some("/tmp/council-runs"));
        let drafter = cfg.roles.get("drafter").unwrap();
        assert_eq!(drafter.model_pack.as_deref(), Some("fast"));
        assert_eq!(drafter.providers.preferred, vec!["anthropic", "openai"]);
    }
}
