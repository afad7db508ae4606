//! Validates a synthesis response against the canonical schema (never the
//! transformed per-provider variant — those exist only to shape the
//! request, §4.3 "Validation").

use council_core::error::{CouncilError, SchemaError};

/// Validate `instance` against `schema`, collecting every violation (not
/// just the first) so a retry prompt can address all of them at once.
pub fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Result<(), CouncilError> {
    let compiled = jsonschema::validator_for(schema)
        .map_err(|e| SchemaError::InvalidSchema(e.to_string()))?;

    let errors: Vec<String> = compiled
        .iter_errors(instance)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::ValidationFailed { errors }.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_instance_passes() {
        let schema = json!({
            "type": "object",
            "properties": {"name": {"type": "string"}},
            "required": ["name"]
        });
        let instance = json!({"name": "council"});
        assert!(validate_against_schema(&schema, &instance).is_ok());
    }

    #[test]
    fn invalid_instance_collects_all_errors() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "integer"}
            },
            "required": ["name", "age"]
        });
        let instance = json!({"age": "not a number"});
        let result = validate_against_schema(&schema, &instance);
        let err = match result {
            Err(CouncilError::Schema(SchemaError::ValidationFailed { errors })) => errors,
            other => panic!("expected ValidationFailed, got {other:?}"),
        };
        assert!(!err.is_empty());
    }

    #[test]
    fn malformed_schema_is_reported_as_invalid_schema() {
        let schema = json!({"type": "not-a-real-type"});
        let instance = json!({});
        let result = validate_against_schema(&schema, &instance);
        assert!(matches!(
            result,
            Err(CouncilError::Schema(SchemaError::InvalidSchema(_)))
        ));
    }
}
