use council_core::error::{CouncilError, ConfigError};

use super::model::CouncilConfig;

const MIN_TEMPERATURE: f32 = 0.0;
const MAX_TEMPERATURE: f32 = 2.0;

/// Validate a loaded configuration: temperature ranges, mode temperature
/// overrides, and reasoning budgets.
pub fn validate(config: &CouncilConfig) -> Result<(), CouncilError> {
    for (role_name, role) in &config.roles {
        validate_temperature(role.temperature)?;

        for mode in role.modes.values() {
            if let Some(temperature) = mode.temperature {
                validate_temperature(temperature)?;
            }
        }

        if role.reasoning.enabled
            && role.reasoning.effort.is_none()
            && role.reasoning.budget_tokens.is_none()
            && role.reasoning.thinking_level.is_none()
        {
            return Err(ConfigError::InvalidReasoningBudget {
                provider: role_name.clone(),
                reason: "reasoning.enabled is true but none of effort, budget_tokens, \
                         or thinking_level is set"
                    .to_string(),
            }
            .into());
        }
    }

    Ok(())
}

fn validate_temperature(value: f32) -> Result<(), CouncilError> {
    if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&value) {
        return Err(ConfigError::InvalidTemperature { value }.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{ReasoningConfig, RoleConfig};
    use std::collections::HashMap;

    fn role_with_temperature(temperature: f32) -> RoleConfig {
        RoleConfig {
            temperature,
            ..RoleConfig::default()
        }
    }

    #[test]
    fn rejects_temperature_above_max() {
        let mut roles = HashMap::new();
        roles.insert("critic".to_string(), role_with_temperature(3.0));
        let config = CouncilConfig {
            roles,
            ..CouncilConfig::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn rejects_enabled_reasoning_with_no_knobs_set() {
        let mut role = role_with_temperature(0.5);
        role.reasoning = ReasoningConfig {
            enabled: true,
            ..ReasoningConfig::default()
        };
        let mut roles = HashMap::new();
        roles.insert("critic".to_string(), role);
        let config = CouncilConfig {
            roles,
            ..CouncilConfig::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn accepts_well_formed_role() {
        let mut roles = HashMap::new();
        roles.insert("critic".to_string(), role_with_temperature(0.7));
        let config = CouncilConfig {
            roles,
            ..CouncilConfig::default()
        };
        assert!(validate(&config).is_ok());
    }
}
