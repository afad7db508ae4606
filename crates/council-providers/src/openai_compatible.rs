//! OpenAI-family HTTP adapter: also serves OpenRouter and any other
//! backend speaking the `/v1/chat/completions` dialect, since the wire
//! shape is shared (§4.1 "OpenAI-compatible family").
//!
//! Structured output is `response_format.json_schema` with `strict: true`
//! when the model supports strict mode (§4.1 point 4, OpenAI variant).
//! Reasoning is `reasoning_effort` ("low" | "medium" | "high"), not a
//! token budget — requests carrying only a `budget_tokens` are mapped to
//! the nearest effort tier (§4.1 point 5).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use council_core::error::CouncilError;

use crate::http_client::{HttpClient, transport_error};
use crate::types::{
    DoctorReport, FinishReason, GenerateRequest, GenerateResponse, Message, MessageRole,
    ProviderAdapter, ProviderCapabilities, ReasoningEffort, Usage, model_matches, resolve_model,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Models that accept `response_format.json_schema` with `strict: true`.
const STRICT_SCHEMA_MODELS: &[&str] = &["gpt-5", "gpt-4.1", "o4", "o3"];

pub struct OpenAiCompatibleAdapter {
    client: HttpClient,
    base_url: String,
    api_key: String,
    provider_name: String,
    default_model: String,
    model_override: Option<String>,
    extra_headers: Vec<(String, String)>,
}

impl OpenAiCompatibleAdapter {
    pub fn new(
        provider_name: String,
        api_key: String,
        base_url: String,
        default_model: String,
        model_override: Option<String>,
    ) -> Result<Self, CouncilError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url,
            api_key,
            provider_name,
            default_model,
            model_override,
            extra_headers: Vec::new(),
        })
    }

    /// OpenRouter requires `HTTP-Referer`/`X-Title` attribution headers in
    /// addition to the shared OpenAI-compatible body shape.
    #[must_use]
    pub fn openrouter(
        api_key: String,
        default_model: String,
        model_override: Option<String>,
    ) -> Result<Self, CouncilError> {
        let mut adapter = Self::new(
            "openrouter".to_string(),
            api_key,
            "https://openrouter.ai/api/v1/chat/completions".to_string(),
            default_model,
            model_override,
        )?;
        adapter.extra_headers.push((
            "HTTP-Referer".to_string(),
            "https://github.com/council-rs/council".to_string(),
        ));
        adapter
            .extra_headers
            .push(("X-Title".to_string(), "council".to_string()));
        Ok(adapter)
    }

    fn effective_model(&self, request: &GenerateRequest) -> String {
        resolve_model(
            request.model.as_deref(),
            self.model_override.as_deref(),
            &self.default_model,
        )
        .to_string()
    }

    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|msg| ChatMessage {
                role: match msg.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                }
                .to_string(),
                content: msg.content.clone(),
            })
            .collect()
    }

    fn reasoning_effort(
        reasoning: Option<&crate::types::ReasoningConfig>,
    ) -> Option<&'static str> {
        let reasoning = reasoning.filter(|r| r.enabled)?;
        if let Some(effort) = reasoning.effort {
            return Some(effort.as_str());
        }
        // No explicit effort enum: derive one from a numeric budget so a
        // role configured for a budget-style provider still degrades
        // sensibly against an effort-style one.
        reasoning.budget_tokens.map(|tokens| {
            if tokens <= 2048 {
                ReasoningEffort::Low.as_str()
            } else if tokens <= 12_000 {
                ReasoningEffort::Medium.as_str()
            } else {
                ReasoningEffort::High.as_str()
            }
        })
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiCompatibleAdapter {
    fn name(&self) -> &str {
        &self.provider_name
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            streaming: true,
            tool_use: true,
            structured_output: true,
            multimodal: true,
            max_output_tokens: 16384,
        }
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, CouncilError> {
        let model = self.effective_model(&request);
        let strict_capable = model_matches(&model, STRICT_SCHEMA_MODELS);

        let response_format = request.structured_output.as_ref().map(|cfg| ResponseFormat {
            kind: "json_schema".to_string(),
            json_schema: JsonSchemaFormat {
                name: cfg.name.clone(),
                schema: cfg.schema.clone(),
                strict: cfg.strict && strict_capable,
            },
        });

        let body = ChatCompletionsRequest {
            model: model.clone(),
            messages: Self::convert_messages(&request.messages),
            max_tokens: request.max_output_tokens,
            temperature: request.temperature,
            response_format,
            reasoning_effort: Self::reasoning_effort(request.reasoning.as_ref()),
        };

        let provider = self.provider_name.clone();
        let response = self
            .client
            .execute_with_retry(
                || {
                    let mut builder = self
                        .client
                        .inner()
                        .post(&self.base_url)
                        .bearer_auth(&self.api_key)
                        .json(&body);
                    for (key, value) in &self.extra_headers {
                        builder = builder.header(key, value);
                    }
                    builder
                },
                DEFAULT_TIMEOUT,
                &provider,
            )
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response.text().await.unwrap_or_default();
            return Err(transport_error(
                &provider,
                format!("HTTP {status}: {body_text}"),
            ));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| transport_error(&provider, format!("invalid JSON response: {e}")))?;

        let parsed: ChatCompletionsResponse = serde_json::from_value(raw.clone())
            .map_err(|e| transport_error(&provider, format!("unexpected response shape: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| transport_error(&provider, "response had no choices"))?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            Some("tool_calls") => FinishReason::ToolCalls,
            _ => FinishReason::Stop,
        };

        let usage = parsed
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        let text = choice.message.content.clone();

        Ok(GenerateResponse {
            text: text.clone(),
            raw_content: text.unwrap_or_default(),
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
            Ok(_) => DoctorReport::ok(
                format!("{} reachable", self.provider_name),
                start.elapsed().as_millis() as u64,
            ),
            Err(e) => DoctorReport::failed(e.display_for_user()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct JsonSchemaFormat {
    name: String,
    schema: serde_json::Value,
    strict: bool,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<&'static str>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<Choice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasoning_effort_passes_through_explicit_enum() {
        let reasoning = crate::types::ReasoningConfig {
            enabled: true,
            effort: Some(ReasoningEffort::High),
            budget_tokens: None,
            thinking_level: None,
        };
        assert_eq!(
            OpenAiCompatibleAdapter::reasoning_effort(Some(&reasoning)),
            Some("high")
        );
    }

    #[test]
    fn reasoning_effort_derives_tier_from_budget() {
        let low = crate::types::ReasoningConfig {
            enabled: true,
            effort: None,
            budget_tokens: Some(1000),
            thinking_level: None,
        };
        let high = crate::types::ReasoningConfig {
            enabled: true,
            effort: None,
            budget_tokens: Some(20_000),
            thinking_level: None,
        };
        assert_eq!(OpenAiCompatibleAdapter::reasoning_effort(Some(&low)), Some("low"));
        assert_eq!(OpenAiCompatibleAdapter::reasoning_effort(Some(&high)), Some("high"));
    }

    #[test]
    fn reasoning_effort_absent_when_disabled() {
        let reasoning = crate::types::ReasoningConfig::default();
        assert_eq!(OpenAiCompatibleAdapter::reasoning_effort(Some(&reasoning)), None);
        assert_eq!(OpenAiCompatibleAdapter::reasoning_effort(None), None);
    }

    #[test]
    fn strict_schema_model_detection() {
        assert!(model_matches("gpt-5-mini", STRICT_SCHEMA_MODELS));
        assert!(!model_matches("gpt-3.5-turbo", STRICT_SCHEMA_MODELS));
    }
}
