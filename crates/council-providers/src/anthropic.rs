//! Claude-family HTTP adapter: Anthropic's Messages API.
//!
//! Structured output is emitted as `output_format.schema` with the
//! `anthropic-beta: output-json-schema-2024-12-06` header (§4.1 point 4,
//! Claude-family variant). Reasoning is emitted as `thinking.budget_tokens`,
//! clamped to `[MIN_BUDGET_TOKENS, MAX_BUDGET_TOKENS]` with a warning on
//! clamp (§4.1 point 5, §8 boundary behavior).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use council_core::error::CouncilError;

use crate::http_client::{HttpClient, transport_error};
use crate::types::{
    DoctorReport, FinishReason, GenerateRequest, GenerateResponse, Message, MessageRole,
    ProviderAdapter, ProviderCapabilities, Usage, clamp_budget_tokens, model_matches,
    resolve_model,
};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const STRUCTURED_OUTPUT_BETA: &str = "output-json-schema-2024-12-06";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const MIN_BUDGET_TOKENS: u32 = 1024;
const MAX_BUDGET_TOKENS: u32 = 32_000;

/// Model families that enforce a structured-output schema natively.
const SCHEMA_ENFORCING_MODELS: &[&str] = &["claude-opus-4", "claude-sonnet-4", "claude-haiku-4"];
/// Older families that only support a JSON-mode prompt fallback.
const JSON_MODE_ONLY_MODELS: &[&str] = &["claude-3-5", "claude-3"];

pub struct AnthropicAdapter {
    client: HttpClient,
    base_url: String,
    api_key: String,
    default_model: String,
    model_override: Option<String>,
}

impl AnthropicAdapter {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        default_model: String,
        model_override: Option<String>,
    ) -> Result<Self, CouncilError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            default_model,
            model_override,
        })
    }

    fn effective_model(&self, request: &GenerateRequest) -> String {
        resolve_model(
            request.model.as_deref(),
            self.model_override.as_deref(),
            &self.default_model,
        )
        .to_string()
    }

    fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<AnthropicMessage>) {
        let mut system_prompt: Option<String> = None;
        let mut out = Vec::new();
        for msg in messages {
            match msg.role {
                MessageRole::System => {
                    if let Some(existing) = system_prompt.as_mut() {
                        existing.push_str("\n\n");
                        existing.push_str(&msg.content);
                    } else {
                        system_prompt = Some(msg.content.clone());
                    }
                }
                MessageRole::User => out.push(AnthropicMessage {
                    role: "user".to_string(),
                    content: msg.content.clone(),
                }),
                MessageRole::Assistant => out.push(AnthropicMessage {
                    role: "assistant".to_string(),
                    content: msg.content.clone(),
                }),
            }
        }
        (system_prompt, out)
    }

    fn thinking_config(
        &self,
        reasoning: Option<&crate::types::ReasoningConfig>,
    ) -> Option<ThinkingConfig> {
        let reasoning = reasoning.filter(|r| r.enabled)?;
        let requested = reasoning
            .budget_tokens
            .or(match reasoning.effort {
                Some(crate::types::ReasoningEffort::Low) => Some(MIN_BUDGET_TOKENS),
                Some(crate::types::ReasoningEffort::Medium) => Some(8192),
                Some(crate::types::ReasoningEffort::High) => Some(MAX_BUDGET_TOKENS),
                None => None,
            })?;
        let (clamped, was_clamped) =
            clamp_budget_tokens(requested, MIN_BUDGET_TOKENS, MAX_BUDGET_TOKENS);
        if was_clamped {
            warn!(
                provider = "anthropic",
                requested, clamped, "reasoning budget_tokens clamped to provider range"
            );
        }
        Some(ThinkingConfig {
            kind: "enabled".to_string(),
            budget_tokens: clamped,
        })
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            streaming: true,
            tool_use: true,
            structured_output: true,
            multimodal: true,
            max_output_tokens: 8192,
        }
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, CouncilError> {
        let model = self.effective_model(&request);
        let (system, messages) = Self::convert_messages(&request.messages);

        let schema_enforced = model_matches(&model, SCHEMA_ENFORCING_MODELS);
        let json_mode_only = !schema_enforced && model_matches(&model, JSON_MODE_ONLY_MODELS);

        let output_format = request
            .structured_output
            .as_ref()
            .filter(|_| schema_enforced)
            .map(|cfg| OutputFormat {
                kind: "json_schema".to_string(),
                schema: cfg.schema.clone(),
            });

        let body = AnthropicRequest {
            model: model.clone(),
            messages,
            max_tokens: request.max_output_tokens.unwrap_or(4096),
            temperature: request.temperature,
            system,
            thinking: self.thinking_config(request.reasoning.as_ref()),
        };

        let mut req_builder = self
            .client
            .inner()
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json");
        if let Some(of) = &output_format {
            req_builder = req_builder
                .header("anthropic-beta", STRUCTURED_OUTPUT_BETA)
                .json(&AnthropicRequestWithFormat {
                    base: body.clone(),
                    output_format: of.clone(),
                });
        } else {
            req_builder = req_builder.json(&body);
        }

        // Structured-output requests against a JSON-mode-only model still go
        // out; the orchestrator's post-hoc validate against the canonical
        // schema handles the downgrade (§4.1 "Model capability classification").
        let _ = json_mode_only;

        let response = self
            .client
            .execute_with_retry(|| req_builder.try_clone().expect("cloneable request"), DEFAULT_TIMEOUT, "anthropic")
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response.text().await.unwrap_or_default();
            return Err(transport_error(
                "anthropic",
                format!("HTTP {status}: {body_text}"),
            ));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| transport_error("anthropic", format!("invalid JSON response: {e}")))?;

        let parsed: AnthropicResponse = serde_json::from_value(raw.clone())
            .map_err(|e| transport_error("anthropic", format!("unexpected response shape: {e}")))?;

        let text: String = parsed
            .content
            .iter()
            .filter(|b| b.content_type == "text")
            .filter_map(|b| b.text.clone())
            .collect();

        let finish_reason = match parsed.stop_reason.as_deref() {
            Some("end_turn") | Some("stop_sequence") => FinishReason::Stop,
            Some("max_tokens") => FinishReason::Length,
            Some("tool_use") => FinishReason::ToolCalls,
            _ => FinishReason::Stop,
        };

        let usage = parsed
            .usage
            .map(|u| Usage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
                total_tokens: u.input_tokens + u.output_tokens,
            })
            .unwrap_or_default();

        Ok(GenerateResponse {
            text: if text.is_empty() { None } else { Some(text.clone()) },
            raw_content: text,
            tool_calls: Vec::new(),
            usage,
            model,
            finish_reason,
            raw,
        })
    }

    async fn doctor(&self) -> DoctorReport {
        let start = Instant::now();
        let probe = GenerateRequest {
            max_output_tokens: Some(1),
            ..GenerateRequest::new(vec![Message::user("ping")])
        };
        match self.generate(probe).await {
            Ok(_) => DoctorReport::ok("anthropic reachable", start.elapsed().as_millis() as u64),
            Err(e) => DoctorReport::failed(e.display_for_user()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ThinkingConfig {
    #[serde(rename = "type")]
    kind: String,
    budget_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
struct OutputFormat {
    #[serde(rename = "type")]
    kind: String,
    schema: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking: Option<ThinkingConfig>,
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicRequestWithFormat {
    #[serde(flatten)]
    base: AnthropicRequest,
    output_format: OutputFormat,
}

#[derive(Debug, Clone, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageRole;

    #[test]
    fn convert_messages_separates_and_concatenates_system() {
        let messages = vec![
            Message::new(MessageRole::System, "first"),
            Message::new(MessageRole::System, "second"),
            Message::user("hi"),
        ];
        let (system, converted) = AnthropicAdapter::convert_messages(&messages);
        assert_eq!(system, Some("first\n\nsecond".to_string()));
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].role, "user");
    }

    #[test]
    fn thinking_config_clamps_budget() {
        let adapter = AnthropicAdapter::new(
            "key".into(),
            None,
            "claude-opus-4".into(),
            None,
        )
        .unwrap();
        let reasoning = crate::types::ReasoningConfig {
            enabled: true,
            effort: None,
            budget_tokens: Some(200_000),
            thinking_level: None,
        };
        let config = adapter.thinking_config(Some(&reasoning)).unwrap();
        assert_eq!(config.budget_tokens, MAX_BUDGET_TOKENS);
    }

    #[test]
    fn thinking_config_absent_when_disabled() {
        let adapter = AnthropicAdapter::new("key".into(), None, "claude-opus-4".into(), None).unwrap();
        let reasoning = crate::types::ReasoningConfig::default();
        assert!(adapter.thinking_config(Some(&reasoning)).is_none());
        assert!(adapter.thinking_config(None).is_none());
    }

    #[test]
    fn model_classification_prefix_matches_dated_ids() {
        assert!(model_matches("claude-opus-4-20250514", SCHEMA_ENFORCING_MODELS));
        assert!(model_matches("claude-3-5-sonnet-20241022", JSON_MODE_ONLY_MODELS));
    }
}
