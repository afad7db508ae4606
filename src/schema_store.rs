//! Loads a role's canonical JSON Schema from disk (§6 "Schema files...
//! stored as files indexed by role name").
//!
//! This is deliberately the facade's job, not the orchestrator's: the
//! orchestrator only ever sees an already-resolved `serde_json::Value`.

use std::path::{Path, PathBuf};

use council_core::error::{ConfigError, CouncilError};

/// Reads `<schema_dir>/<file_stem>.json` and parses it as a canonical
/// JSON Schema. `file_stem` is a role's `schema` override if set,
/// otherwise its canonical name.
pub fn load(schema_dir: &Path, file_stem: &str) -> Result<serde_json::Value, CouncilError> {
    let path = schema_path(schema_dir, file_stem);
    let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::InvalidFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| {
        ConfigError::InvalidFile {
            path: path.display().to_string(),
            reason: format!("not valid JSON: {e}"),
        }
        .into()
    })
}

fn schema_path(schema_dir: &Path, file_stem: &str) -> PathBuf {
    schema_dir.join(format!("{file_stem}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_a_well_formed_schema_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("drafter.json"),
            r#"{"type": "object", "properties": {"answer": {"type": "string"}}}"#,
        )
        .unwrap();

        let schema = load(dir.path(), "drafter").unwrap();
        assert_eq!(schema["type"], "object");
    }

    #[test]
    fn missing_schema_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load(dir.path(), "missing-role");
        assert!(matches!(
            result,
            Err(CouncilError::Config(ConfigError::InvalidFile { .. }))
        ));
    }

    #[test]
    fn malformed_schema_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        let result = load(dir.path(), "broken");
        assert!(matches!(
            result,
            Err(CouncilError::Config(ConfigError::InvalidFile { .. }))
        ));
    }
}
