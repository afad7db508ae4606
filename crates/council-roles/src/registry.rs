//! Role Registry (§4.4): resolves a role name (canonical or deprecated
//! alias) plus an optional mode into a fully composed [`Role`].

use std::collections::HashMap;

use council_config::{CouncilConfig, RoleConfig};
use council_core::error::{ConfigError, CouncilError};

use crate::alias::{resolve_alias, warn_once_deprecated};
use crate::protocol::COUNCIL_PROTOCOL;
use crate::role::Role;

pub struct RoleRegistry {
    roles: HashMap<String, RoleConfig>,
    model_packs: HashMap<String, HashMap<String, String>>,
}

impl RoleRegistry {
    #[must_use]
    pub fn new(config: &CouncilConfig) -> Self {
        Self {
            roles: config.roles.clone(),
            model_packs: config.model_packs.clone(),
        }
    }

    /// Resolve `name`/`mode` into a fully composed [`Role`] (§4.4):
    ///
    /// 1. If `name` is canonical, return it.
    /// 2. If it's a deprecated alias, emit a one-time deprecation notice and
    ///    return the canonical role with the alias's mode baked in.
    /// 3. If a mode was supplied but the role doesn't recognize it, fail.
    pub fn resolve(&self, name: &str, mode: Option<&str>) -> Result<Role, CouncilError> {
        if let Some(role_config) = self.roles.get(name) {
            return self.compose(name, role_config, mode);
        }

        if let Some((canonical, implied_mode)) = resolve_alias(name) {
            warn_once_deprecated(name, canonical);
            let role_config = self.roles.get(canonical).ok_or_else(|| {
                ConfigError::UnknownRole {
                    role: canonical.to_string(),
                }
            })?;
            // An explicitly supplied mode overrides the alias's implied one.
            let effective_mode = mode.or(Some(implied_mode));
            return self.compose(canonical, role_config, effective_mode);
        }

        Err(ConfigError::UnknownRole {
            role: name.to_string(),
        }
        .into())
    }

    fn compose(
        &self,
        canonical_name: &str,
        role_config: &RoleConfig,
        mode: Option<&str>,
    ) -> Result<Role, CouncilError> {
        let mut system_prompt = role_config.system_prompt.clone();
        let mode_name = match mode {
            Some(mode_name) => {
                let mode_config = role_config.modes.get(mode_name).ok_or_else(|| {
                    ConfigError::UnknownMode {
                        role: canonical_name.to_string(),
                        mode: mode_name.to_string(),
                    }
                })?;
                if !mode_config.system_prompt_suffix.is_empty() {
                    system_prompt.push_str("\n\n");
                    system_prompt.push_str(&mode_config.system_prompt_suffix);
                }
                Some(mode_name.to_string())
            }
            None => None,
        };

        system_prompt.push_str("\n\n");
        system_prompt.push_str(COUNCIL_PROTOCOL);

        let temperature = mode
            .and_then(|m| role_config.modes.get(m))
            .and_then(|m| m.temperature)
            .unwrap_or(role_config.temperature);

        Ok(Role {
            name: canonical_name.to_string(),
            mode: mode_name,
            system_prompt,
            model_pack: role_config.model_pack.clone(),
            models: self.resolve_models(role_config),
            providers: role_config.providers.clone(),
            reasoning: role_config.reasoning.clone(),
            temperature,
            schema: role_config.schema.clone(),
        })
    }

    /// Merge the role's model pack (a provider -> model-id mapping named by
    /// `role_config.model_pack`) with its explicit per-provider `models`
    /// overrides, which take precedence (§3 "Model pack: ... overridable by
    /// ... per-role overrides").
    fn resolve_models(&self, role_config: &RoleConfig) -> HashMap<String, String> {
        let mut models = role_config
            .model_pack
            .as_deref()
            .and_then(|pack_name| self.model_packs.get(pack_name))
            .cloned()
            .unwrap_or_default();
        for (provider, model) in &role_config.models {
            models.insert(provider.clone(), model.clone());
        }
        models
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_config::ModeConfig;

    fn config_with_drafter() -> CouncilConfig {
        let mut config = CouncilConfig::default();
        let mut drafter = RoleConfig {
            system_prompt: "Draft a solution.".to_string(),
            ..RoleConfig::default()
        };
        drafter.modes.insert(
            "impl".to_string(),
            ModeConfig {
                system_prompt_suffix: "Favor working code over prose.".to_string(),
                temperature: Some(0.2),
            },
        );
        config.roles.insert("drafter".to_string(), drafter);
        config
    }

    #[test]
    fn resolves_canonical_role() {
        let registry = RoleRegistry::new(&config_with_drafter());
        let role = registry.resolve("drafter", None).unwrap();
        assert_eq!(role.name, "drafter");
        assert!(role.system_prompt.contains("Draft a solution."));
        assert!(role.system_prompt.contains("equal standing"));
    }

    #[test]
    fn resolves_mode_and_overrides_temperature() {
        let registry = RoleRegistry::new(&config_with_drafter());
        let role = registry.resolve("drafter", Some("impl")).unwrap();
        assert_eq!(role.mode.as_deref(), Some("impl"));
        assert!(role.system_prompt.contains("Favor working code"));
        assert_eq!(role.temperature, 0.2);
    }

    #[test]
    fn unknown_mode_fails() {
        let registry = RoleRegistry::new(&config_with_drafter());
        let result = registry.resolve("drafter", Some("nonexistent"));
        assert!(matches!(
            result,
            Err(CouncilError::Config(ConfigError::UnknownMode { .. }))
        ));
    }

    #[test]
    fn deprecated_alias_resolves_to_canonical_with_implied_mode() {
        let registry = RoleRegistry::new(&config_with_drafter());
        let role = registry.resolve("implementer", None).unwrap();
        assert_eq!(role.name, "drafter");
        assert_eq!(role.mode.as_deref(), Some("impl"));
    }

    #[test]
    fn explicit_mode_overrides_alias_implied_mode() {
        let mut config = config_with_drafter();
        config.roles.get_mut("drafter").unwrap().modes.insert(
            "other".to_string(),
            ModeConfig {
                system_prompt_suffix: "Other mode.".to_string(),
                temperature: None,
            },
        );
        let registry = RoleRegistry::new(&config);
        let role = registry.resolve("implementer", Some("other")).unwrap();
        assert_eq!(role.mode.as_deref(), Some("other"));
    }

    #[test]
    fn unknown_role_name_fails() {
        let registry = RoleRegistry::new(&config_with_drafter());
        let result = registry.resolve("not-a-role", None);
        assert!(matches!(
            result,
            Err(CouncilError::Config(ConfigError::UnknownRole { .. }))
        ));
    }

    #[test]
    fn model_pack_resolves_into_role_models() {
        let mut config = config_with_drafter();
        config.roles.get_mut("drafter").unwrap().model_pack = Some("fast".to_string());
        config.model_packs.insert(
            "fast".to_string(),
            HashMap::from([
                ("anthropic".to_string(), "claude-haiku-4".to_string()),
                ("openai".to_string(), "gpt-5-mini".to_string()),
            ]),
        );
        let registry = RoleRegistry::new(&config);
        let role = registry.resolve("drafter", None).unwrap();
        assert_eq!(role.models.get("anthropic").map(String::as_str), Some("claude-haiku-4"));
        assert_eq!(role.models.get("openai").map(String::as_str), Some("gpt-5-mini"));
    }

    #[test]
    fn explicit_model_override_beats_model_pack() {
        let mut config = config_with_drafter();
        let drafter = config.roles.get_mut("drafter").unwrap();
        drafter.model_pack = Some("fast".to_string());
        drafter.models.insert("anthropic".to_string(), "claude-opus-4".to_string());
        config.model_packs.insert(
            "fast".to_string(),
            HashMap::from([("anthropic".to_string(), "claude-haiku-4".to_string())]),
        );
        let registry = RoleRegistry::new(&config);
        let role = registry.resolve("drafter", None).unwrap();
        assert_eq!(role.models.get("anthropic").map(String::as_str), Some("claude-opus-4"));
    }
}
