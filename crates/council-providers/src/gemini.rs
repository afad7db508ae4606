//! Gemini-family HTTP adapter: Google's `generateContent` API.
//!
//! Structured output is `generationConfig.response_mime_type =
//! "application/json"` plus `response_schema` (§4.1 point 4, Gemini
//! variant — note the schema key sits under `generationConfig`, not at
//! the request's top level like the other two families). Reasoning is
//! `generationConfig.thinkingConfig.thinkingBudget`, a numeric token
//! count like Anthropic's but with a distinct valid range.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use council_core::error::CouncilError;

use crate::http_client::{HttpClient, transport_error};
use crate::types::{
    DoctorReport, FinishReason, GenerateRequest, GenerateResponse, Message, MessageRole,
    ProviderAdapter, ProviderCapabilities, Usage, clamp_budget_tokens, resolve_model,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const MIN_THINKING_BUDGET: u32 = 0;
const MAX_THINKING_BUDGET: u32 = 24_576;

pub struct GeminiAdapter {
    client: HttpClient,
    base_url: String,
    api_key: String,
    default_model: String,
    model_override: Option<String>,
}

impl GeminiAdapter {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        default_model: String,
        model_override: Option<String>,
    ) -> Result<Self, CouncilError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: base_url
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string()),
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

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        )
    }

    fn convert_contents(messages: &[Message]) -> (Option<SystemInstruction>, Vec<Content>) {
        let mut system_instruction = None;
        let mut contents = Vec::new();
        for msg in messages {
            match msg.role {
                MessageRole::System => {
                    system_instruction = Some(SystemInstruction {
                        parts: vec![Part {
                            text: msg.content.clone(),
                        }],
                    });
                }
                MessageRole::User => contents.push(Content {
                    role: "user".to_string(),
                    parts: vec![Part {
                        text: msg.content.clone(),
                    }],
                }),
                MessageRole::Assistant => contents.push(Content {
                    role: "model".to_string(),
                    parts: vec![Part {
                        text: msg.content.clone(),
                    }],
                }),
            }
        }
        (system_instruction, contents)
    }

    fn thinking_config(
        &self,
        reasoning: Option<&crate::types::ReasoningConfig>,
    ) -> Option<ThinkingConfig> {
        let reasoning = reasoning.filter(|r| r.enabled)?;
        let requested = reasoning.budget_tokens?;
        let (clamped, was_clamped) =
            clamp_budget_tokens(requested, MIN_THINKING_BUDGET, MAX_THINKING_BUDGET);
        if was_clamped {
            warn!(
                provider = "gemini",
                requested, clamped, "thinkingBudget clamped to provider range"
            );
        }
        Some(ThinkingConfig {
            thinking_budget: clamped,
        })
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn name(&self) -> &str {
        "gemini"
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
        let (system_instruction, contents) = Self::convert_contents(&request.messages);

        let (response_mime_type, response_schema) = match &request.structured_output {
            Some(cfg) => (
                Some("application/json".to_string()),
                Some(cfg.schema.clone()),
            ),
            None => (None, None),
        };

        let body = GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
                response_mime_type,
                response_schema,
                thinking_config: self.thinking_config(request.reasoning.as_ref()),
            },
        };

        let url = self.endpoint(&model);
        let response = self
            .client
            .execute_with_retry(
                || self.client.inner().post(&url).json(&body),
                DEFAULT_TIMEOUT,
                "gemini",
            )
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response.text().await.unwrap_or_default();
            return Err(transport_error(
                "gemini",
                format!("HTTP {status}: {body_text}"),
            ));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| transport_error("gemini", format!("invalid JSON response: {e}")))?;

        let parsed: GenerateContentResponse = serde_json::from_value(raw.clone())
            .map_err(|e| transport_error("gemini", format!("unexpected response shape: {e}")))?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| transport_error("gemini", "response had no candidates"))?;

        let text: String = candidate
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();

        let finish_reason = match candidate.finish_reason.as_deref() {
            Some("STOP") => FinishReason::Stop,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("RECITATION") => FinishReason::ContentFilter,
            _ => FinishReason::Stop,
        };

        let usage = parsed
            .usage_metadata
            .map(|u| Usage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
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
            Ok(_) => DoctorReport::ok("gemini reachable", start.elapsed().as_millis() as u64),
            Err(e) => DoctorReport::failed(e.display_for_user()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Clone, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseContent {
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: ResponseContent,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: u64,
    candidates_token_count: u64,
    total_token_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_contents_maps_assistant_to_model_role() {
        let messages = vec![
            Message::system("be terse"),
            Message::user("hi"),
            Message::assistant("hello"),
        ];
        let (system, contents) = GeminiAdapter::convert_contents(&messages);
        assert!(system.is_some());
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[1].role, "model");
    }

    #[test]
    fn thinking_config_clamps_to_provider_range() {
        let adapter = GeminiAdapter::new("key".into(), None, "gemini-2.5-pro".into(), None).unwrap();
        let reasoning = crate::types::ReasoningConfig {
            enabled: true,
            effort: None,
            budget_tokens: Some(100_000),
            thinking_level: None,
        };
        let config = adapter.thinking_config(Some(&reasoning)).unwrap();
        assert_eq!(config.thinking_budget, MAX_THINKING_BUDGET);
    }
}
