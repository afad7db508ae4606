//! Dispatches the canonical-schema-to-provider-dialect transform (§4.3) by
//! provider family, keyed on the adapter's own `name()` string so the
//! orchestrator never needs to know an adapter's concrete type.

use council_schema::{to_claude, to_gemini, to_openai_strict};
use serde_json::Value;

/// Transform `canonical_schema` into the dialect the named provider
/// expects. Matched by substring against the adapter-name conventions
/// already in use in `council-providers` (`"anthropic"`/`"claude-cli"` for
/// Claude-family, `"gemini"`/`"gemini-cli"` for Gemini-family, everything
/// else falls through to the OpenAI-compatible strict-mode variant).
#[must_use]
pub fn transform_for_provider(provider_name: &str, canonical_schema: &Value) -> Value {
    if provider_name.contains("claude") || provider_name.contains("anthropic") {
        to_claude(canonical_schema)
    } else if provider_name.contains("gemini") {
        to_gemini(canonical_schema)
    } else {
        to_openai_strict(canonical_schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn anthropic_gets_claude_variant() {
        let schema = json!({"$schema": "x", "type": "object"});
        let transformed = transform_for_provider("anthropic", &schema);
        assert!(transformed.get("$schema").is_none());
    }

    #[test]
    fn gemini_gets_gemini_variant() {
        let schema = json!({"title": "Answer", "type": "object"});
        let transformed = transform_for_provider("gemini", &schema);
        assert!(transformed.get("title").is_none());
    }

    #[test]
    fn unrecognized_provider_falls_back_to_openai_strict() {
        let schema = json!({
            "type": "object",
            "properties": {"a": {"type": "string"}}
        });
        let transformed = transform_for_provider("openrouter", &schema);
        assert_eq!(transformed["additionalProperties"], json!(false));
    }
}
