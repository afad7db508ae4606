//! Schema Transformer & Validator (§4.3): canonical JSON Schema to
//! per-provider-family structured-output dialects, and schema validation
//! of synthesis responses.

pub mod transform;
pub mod validate;

pub use transform::{to_claude, to_gemini, to_openai_strict};
pub use validate::validate_against_schema;
