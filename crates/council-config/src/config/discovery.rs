use camino::Utf8PathBuf;
use council_core::error::{CouncilError, ConfigError};
use std::env;
use std::path::Path;

use super::model::CouncilConfig;

const CONFIG_FILE_NAME: &str = "council.toml";

/// Discover and load configuration with precedence:
/// `COUNCIL_CONFIG_PATH` env var > `council.toml` found by walking up from
/// the current directory > `~/.config/council/config.toml` > built-in
/// defaults (an empty `CouncilConfig`).
pub fn discover() -> Result<CouncilConfig, CouncilError> {
    let start_dir = std::env::current_dir().map_err(CouncilError::Io)?;
    discover_from(&start_dir)
}

/// Path-driven variant used by tests to avoid relying on the process's
/// current directory.
pub fn discover_from(start_dir: &Path) -> Result<CouncilConfig, CouncilError> {
    if let Ok(explicit) = env::var("COUNCIL_CONFIG_PATH") {
        return load_file(Path::new(&explicit));
    }

    if let Some(found) = find_upward(start_dir) {
        return load_file(&found);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let candidate = config_dir.join("council").join("config.toml");
        if candidate.is_file() {
            return load_file(&candidate);
        }
    }

    Ok(CouncilConfig::default())
}

fn find_upward(start_dir: &Path) -> Option<std::path::PathBuf> {
    let mut dir = start_dir.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

fn load_file(path: &Path) -> Result<CouncilConfig, CouncilError> {
    let content = std::fs::read_to_string(path).map_err(CouncilError::Io)?;
    let mut config: CouncilConfig =
        toml::from_str(&content).map_err(|e| ConfigError::InvalidFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    apply_env_overrides(&mut config);
    super::validation::validate(&config)?;
    Ok(config)
}

/// Layer environment variable overrides on top of a loaded config.
///
/// `<PROVIDER>_API_KEY` is read by the provider adapters directly and isn't
/// stored here. `COUNCIL_MODEL_FAST` / `_REASONING` / `_CODE` / `_CRITIC`
/// override the corresponding entry of the `fast` / `reasoning` / `code` /
/// `critic` model pack for every provider listed in that env var's value,
/// formatted as `provider=model,provider=model`. `COUNCIL_MODELS`, same
/// `provider=model,...` form, is a blanket override applied directly to
/// every role's resolved `models` map rather than to a named pack (§6
/// "multi-model overrides (`COUNCIL_MODELS`)", distinct from the per-tag
/// vars above).
fn apply_env_overrides(config: &mut CouncilConfig) {
    for (pack_name, env_var) in [
        ("fast", "COUNCIL_MODEL_FAST"),
        ("reasoning", "COUNCIL_MODEL_REASONING"),
        ("code", "COUNCIL_MODEL_CODE"),
        ("critic", "COUNCIL_MODEL_CRITIC"),
    ] {
        let Ok(value) = env::var(env_var) else {
            continue;
        };
        let pack = config.model_packs.entry(pack_name.to_string()).or_default();
        for entry in value.split(',') {
            if let Some((provider, model)) = entry.split_once('=') {
                pack.insert(provider.trim().to_string(), model.trim().to_string());
            }
        }
    }

    if let Ok(value) = env::var("COUNCIL_MODELS") {
        let pairs: Vec<(String, String)> = value
            .split(',')
            .filter_map(|entry| entry.split_once('='))
            .map(|(provider, model)| (provider.trim().to_string(), model.trim().to_string()))
            .collect();
        for role in config.roles.values_mut() {
            for (provider, model) in &pairs {
                role.models.insert(provider.clone(), model.clone());
            }
        }
    }

    if let Ok(root) = env::var("COUNCIL_STORE_ROOT") {
        config.store.root = Some(root);
    }

    if let Ok(dir) = env::var("COUNCIL_SCHEMA_DIR") {
        config.schema_dir = Some(dir);
    }
}

#[must_use]
pub fn default_store_root() -> Utf8PathBuf {
    council_core::paths::default_store_root()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    #[serial]
    fn council_models_env_override_layers_onto_every_role() {
        let mut config = CouncilConfig::default();
        config.roles.insert("drafter".to_string(), super::super::model::RoleConfig::default());
        config.roles.insert("critic".to_string(), super::super::model::RoleConfig::default());
        config
            .roles
            .get_mut("critic")
            .unwrap()
            .models
            .insert("anthropic".to_string(), "claude-opus-4".to_string());

        // SAFETY: test-only override, guarded by #[serial] against concurrent env access.
        unsafe {
            env::set_var("COUNCIL_MODELS", "anthropic=claude-haiku-4,openai=gpt-5-mini");
        }
        apply_env_overrides(&mut config);
        unsafe {
            env::remove_var("COUNCIL_MODELS");
        }

        assert_eq!(
            config.roles["drafter"].models.get("anthropic").map(String::as_str),
            Some("claude-haiku-4")
        );
        assert_eq!(
            config.roles["drafter"].models.get("openai").map(String::as_str),
            Some("gpt-5-mini")
        );
        // COUNCIL_MODELS is a blanket override: it replaces a role's
        // explicit per-provider model too, same as the per-tag vars do to
        // their pack entries.
        assert_eq!(
            config.roles["critic"].models.get("anthropic").map(String::as_str),
            Some("claude-haiku-4")
        );
    }

    #[test]
    fn discover_from_walks_up_to_find_config() {
        let temp = tempfile::tempdir().unwrap();
        let nested = temp.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[roles.critic]\nsystem_prompt = \"Critique.\"\n",
        )
        .unwrap();

        // SAFETY: test-only override, no concurrent access to this env var in this test.
        unsafe {
            env::remove_var("COUNCIL_CONFIG_PATH");
        }
        let config = discover_from(&nested).unwrap();
        assert!(config.roles.contains_key("critic"));
    }

    #[test]
    fn discover_from_defaults_when_nothing_found() {
        let temp = tempfile::tempdir().unwrap();
        unsafe {
            env::remove_var("COUNCIL_CONFIG_PATH");
        }
        let config = discover_from(temp.path()).unwrap();
        assert!(config.roles.is_empty());
    }
}
