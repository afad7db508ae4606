//! Canonical provider-adapter types: the uniform request/response contract
//! every backend family translates to and from its own wire dialect.
//!
//! See SPEC_FULL.md §2 ("Provider Adapter — expanded") for the rationale
//! behind each field.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use council_core::error::CouncilError;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Discrete reasoning-effort levels for providers with an effort enum
/// instead of a numeric token budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

impl ReasoningEffort {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Named thinking-level tiers for providers with an enumerated scheme
/// distinct from the effort/budget styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThinkingLevel {
    Minimal,
    Low,
    Medium,
    High,
}

impl ThinkingLevel {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "minimal" => Some(Self::Minimal),
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Resolved reasoning configuration for a single `generate` call. Produced
/// from `council_config::ReasoningConfig` by the orchestrator/role registry;
/// adapters never parse the raw TOML strings themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReasoningConfig {
    pub enabled: bool,
    pub effort: Option<ReasoningEffort>,
    pub budget_tokens: Option<u32>,
    pub thinking_level: Option<ThinkingLevel>,
}

/// Structured-output request: a canonical JSON Schema the response must
/// validate against, a name, and whether strict enforcement is required.
#[derive(Debug, Clone)]
pub struct StructuredOutputConfig {
    pub schema: serde_json::Value,
    pub name: String,
    pub strict: bool,
}

/// Canonical request every adapter translates into its backend's dialect.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub messages: Vec<Message>,
    pub model: Option<String>,
    pub max_output_tokens: Option<u32>,
    pub temperature: f32,
    pub stream: bool,
    pub structured_output: Option<StructuredOutputConfig>,
    pub reasoning: Option<ReasoningConfig>,
    /// Legacy opaque response-format passthrough for callers that already
    /// have a provider-native format and don't want it re-derived.
    pub response_format: Option<serde_json::Value>,
}

impl GenerateRequest {
    #[must_use]
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            model: None,
            max_output_tokens: None,
            temperature: 0.7,
            stream: false,
            structured_output: None,
            reasoning: None,
            response_format: None,
        }
    }
}

/// Token usage reported by a provider for a single call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

/// Why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
    Error,
}

/// Canonical response every adapter produces from its backend's dialect.
#[derive(Debug, Clone)]
pub struct GenerateResponse {
    pub text: Option<String>,
    pub raw_content: String,
    pub tool_calls: Vec<serde_json::Value>,
    pub usage: Usage,
    pub model: String,
    pub finish_reason: FinishReason,
    pub raw: serde_json::Value,
}

/// A single streamed partial response.
#[derive(Debug, Clone)]
pub struct GenerateDelta {
    pub text_delta: String,
    pub finish_reason: Option<FinishReason>,
}

/// Static capability descriptor for a provider adapter.
#[derive(Debug, Clone, Copy)]
pub struct ProviderCapabilities {
    pub streaming: bool,
    pub tool_use: bool,
    pub structured_output: bool,
    pub multimodal: bool,
    pub max_output_tokens: u32,
}

/// Result of a `doctor()` health probe.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorReport {
    pub ok: bool,
    pub message: String,
    pub latency_ms: Option<u64>,
    pub details: serde_json::Value,
}

impl DoctorReport {
    #[must_use]
    pub fn ok(message: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            ok: true,
            message: message.into(),
            latency_ms: Some(latency_ms),
            details: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            latency_ms: None,
            details: serde_json::Value::Null,
        }
    }
}

/// Uniform contract over a heterogeneous LLM backend (§4.1).
///
/// Adapters must not silently swallow transport errors: 4xx, 5xx, and
/// timeouts are reported as typed `CouncilError`s and the orchestrator
/// decides retry policy, never the adapter.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable provider name used for registry lookup and result keys.
    fn name(&self) -> &str;

    /// Static capability descriptor.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Invoke the backend, consuming any stream to completion.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, CouncilError>;

    /// Whether this adapter supports a named capability
    /// (`"streaming"`, `"tool_use"`, `"structured_output"`, `"multimodal"`).
    fn supports(&self, capability: &str) -> bool {
        let caps = self.capabilities();
        match capability {
            "streaming" => caps.streaming,
            "tool_use" => caps.tool_use,
            "structured_output" => caps.structured_output,
            "multimodal" => caps.multimodal,
            _ => false,
        }
    }

    /// Side-effect-free (modulo network) health probe.
    async fn doctor(&self) -> DoctorReport;
}

/// Whether `model` matches one of `known` exactly or by family prefix, so a
/// dated model id like `claude-opus-4-20250514` still resolves against a
/// registered prefix `claude-opus-4`.
#[must_use]
pub fn model_matches(model: &str, known: &[&str]) -> bool {
    known
        .iter()
        .any(|candidate| model == *candidate || model.starts_with(candidate))
}

/// Resolve the effective model for a call: explicit request model takes
/// precedence over a role's per-provider override, which takes precedence
/// over the adapter's own default (§4.1 point 1).
#[must_use]
pub fn resolve_model<'a>(
    request_model: Option<&'a str>,
    role_override: Option<&'a str>,
    adapter_default: &'a str,
) -> &'a str {
    request_model
        .or(role_override)
        .unwrap_or(adapter_default)
}

/// Clamp a reasoning token budget into `[min, max]`, returning the clamped
/// value and whether clamping occurred (so the caller can log a warning).
#[must_use]
pub fn clamp_budget_tokens(requested: u32, min: u32, max: u32) -> (u32, bool) {
    let clamped = requested.clamp(min, max);
    (clamped, clamped != requested)
}

/// Per-provider model id override, resolved from a role's `models` map.
pub type ModelOverrides = HashMap<String, String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_matches_exact_and_prefix() {
        let known = ["claude-opus-4", "claude-haiku-4"];
        assert!(model_matches("claude-opus-4", &known));
        assert!(model_matches("claude-opus-4-20250514", &known));
        assert!(!model_matches("gpt-5", &known));
    }

    #[test]
    fn resolve_model_precedence() {
        assert_eq!(
            resolve_model(Some("explicit"), Some("role-override"), "default"),
            "explicit"
        );
        assert_eq!(
            resolve_model(None, Some("role-override"), "default"),
            "role-override"
        );
        assert_eq!(resolve_model(None, None, "default"), "default");
    }

    #[test]
    fn clamp_budget_tokens_clamps_and_reports() {
        assert_eq!(clamp_budget_tokens(200_000, 1024, 24576), (24576, true));
        assert_eq!(clamp_budget_tokens(100, 1024, 24576), (1024, true));
        assert_eq!(clamp_budget_tokens(4096, 1024, 24576), (4096, false));
    }
}
