//! Canonical-schema → provider-dialect transforms (§4.3). Each function is
//! pure: no I/O, no adapter knowledge, just a `serde_json::Value` in and a
//! `serde_json::Value` out, so they are exhaustively unit-testable.

use serde_json::{Map, Value};

/// `format` values every provider is assumed to pass through; anything else
/// is stripped by the OpenAI-strict variant.
const ALLOWED_FORMATS: &[&str] = &[
    "date-time", "time", "date", "duration", "email", "hostname", "ipv4", "ipv6", "uuid",
];

/// Meta fields the Gemini-family variant does not understand and strips
/// recursively, at every level including nested object/array schemas.
const GEMINI_STRIPPED_FIELDS: &[&str] = &[
    "title",
    "additionalProperties",
    "default",
    "examples",
    "minLength",
    "maxLength",
    "minimum",
    "maximum",
    "pattern",
    "format",
    "minItems",
    "maxItems",
    "uniqueItems",
    "$schema",
];

/// Produce the OpenAI-family strict-mode variant: every object gets
/// `additionalProperties: false` and all declared properties become
/// required, applied recursively to nested objects and arrays of objects.
/// Unsupported `format` values are stripped.
#[must_use]
pub fn to_openai_strict(schema: &Value) -> Value {
    let mut out = schema.clone();
    strict_in_place(&mut out);
    out
}

fn strict_in_place(value: &mut Value) {
    let Value::Object(map) = value else {
        return;
    };

    if let Some(format) = map.get("format").and_then(Value::as_str) {
        if !ALLOWED_FORMATS.contains(&format) {
            map.remove("format");
        }
    }

    let is_object_schema = map.get("type").and_then(Value::as_str) == Some("object");

    if is_object_schema {
        if let Some(Value::Object(properties)) = map.get("properties") {
            let required: Vec<Value> = properties
                .keys()
                .map(|k| Value::String(k.clone()))
                .collect();
            map.insert("required".to_string(), Value::Array(required));
        }
        map.insert("additionalProperties".to_string(), Value::Bool(false));
    }

    if let Some(Value::Object(properties)) = map.get_mut("properties") {
        for (_, prop_schema) in properties.iter_mut() {
            strict_in_place(prop_schema);
        }
    }

    if let Some(items) = map.get_mut("items") {
        strict_in_place(items);
    }
}

/// Produce the Claude-family variant: strip the `$schema` meta field. The
/// `output_format`/beta-header wrapping is an HTTP request-shape concern
/// owned by the adapter, not this transform.
#[must_use]
pub fn to_claude(schema: &Value) -> Value {
    let mut out = schema.clone();
    if let Value::Object(map) = &mut out {
        map.remove("$schema");
    }
    out
}

/// Produce the Gemini-family variant: strip the unsupported meta fields
/// recursively, with `title` exempted when it's a key inside a
/// `properties` map rather than the schema's own meta field.
#[must_use]
pub fn to_gemini(schema: &Value) -> Value {
    let mut out = schema.clone();
    gemini_strip_in_place(&mut out, true);
    out
}

fn gemini_strip_in_place(value: &mut Value, is_schema_level: bool) {
    let Value::Object(map) = value else {
        return;
    };

    if is_schema_level {
        for field in GEMINI_STRIPPED_FIELDS {
            map.remove(*field);
        }
    }

    if let Some(Value::Object(properties)) = map.get_mut("properties") {
        strip_properties(properties);
    }

    if let Some(items) = map.get_mut("items") {
        gemini_strip_in_place(items, true);
    }
}

/// `properties` is itself a map of property-name -> sub-schema. The keys
/// (which may legitimately be named `title`) are never touched; only each
/// sub-schema's own meta fields are stripped, recursively.
fn strip_properties(properties: &mut Map<String, Value>) {
    for (_, sub_schema) in properties.iter_mut() {
        gemini_strip_in_place(sub_schema, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn openai_strict_marks_object_properties_required_and_closed() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "integer"}
            }
        });
        let transformed = to_openai_strict(&schema);
        assert_eq!(transformed["additionalProperties"], json!(false));
        let required = transformed["required"].as_array().unwrap();
        assert!(required.contains(&json!("name")));
        assert!(required.contains(&json!("age")));
    }

    #[test]
    fn openai_strict_strips_unsupported_format() {
        let schema = json!({"type": "string", "format": "regex"});
        let transformed = to_openai_strict(&schema);
        assert!(transformed.get("format").is_none());
    }

    #[test]
    fn openai_strict_keeps_allowed_format() {
        let schema = json!({"type": "string", "format": "uuid"});
        let transformed = to_openai_strict(&schema);
        assert_eq!(transformed["format"], json!("uuid"));
    }

    #[test]
    fn openai_strict_recurses_into_nested_objects_and_arrays() {
        let schema = json!({
            "type": "object",
            "properties": {
                "items": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {"id": {"type": "string"}}
                    }
                }
            }
        });
        let transformed = to_openai_strict(&schema);
        let inner = &transformed["properties"]["items"]["items"];
        assert_eq!(inner["additionalProperties"], json!(false));
        assert_eq!(inner["required"], json!(["id"]));
    }

    #[test]
    fn claude_variant_strips_schema_meta_field() {
        let schema = json!({"$schema": "http://json-schema.org/draft-07/schema#", "type": "object"});
        let transformed = to_claude(&schema);
        assert!(transformed.get("$schema").is_none());
        assert_eq!(transformed["type"], json!("object"));
    }

    #[test]
    fn gemini_variant_strips_meta_fields_recursively() {
        let schema = json!({
            "title": "Answer",
            "type": "object",
            "minLength": 1,
            "properties": {
                "title": {"type": "string", "format": "email", "maxLength": 10}
            }
        });
        let transformed = to_gemini(&schema);
        assert!(transformed.get("title").is_none());
        assert!(transformed.get("minLength").is_none());
        // "title" survives as a *property key*
        assert!(transformed["properties"].get("title").is_some());
        // but that sub-schema's own format/maxLength meta fields are stripped
        assert!(transformed["properties"]["title"].get("format").is_none());
        assert!(transformed["properties"]["title"].get("maxLength").is_none());
    }
}
