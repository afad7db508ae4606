//! CLI-backed Claude adapter: shells out to a locally installed `claude`
//! binary instead of calling the HTTP API directly, for environments that
//! authenticate through the CLI's own session rather than a bare API key
//! (§4.1 "CLI-backed family").
//!
//! Structured output and reasoning configuration are passed as CLI flags
//! rather than request-body fields; the CLI itself talks to the same
//! backend the HTTP adapter does, so the canonical request/response types
//! are unchanged. All invocation goes through [`council_runner::CommandSpec`]
//! — argv-style only, never a shell string.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use council_runner::{CommandSpec, run_async};
use which::which;

use council_core::error::{CouncilError, ProviderError};

use crate::cli_support::{flatten_prompt, runner_error_to_provider_error};
use crate::types::{
    DoctorReport, FinishReason, GenerateRequest, GenerateResponse, Message, ProviderAdapter,
    ProviderCapabilities, Usage,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

pub struct ClaudeCliAdapter {
    binary: String,
    default_model: String,
    model_override: Option<String>,
}

impl ClaudeCliAdapter {
    pub fn new(
        binary: Option<String>,
        default_model: String,
        model_override: Option<String>,
    ) -> Self {
        Self {
            binary: binary.unwrap_or_else(|| "claude".to_string()),
            default_model,
            model_override,
        }
    }

    fn effective_model(&self, request: &GenerateRequest) -> String {
        request
            .model
            .clone()
            .or_else(|| self.model_override.clone())
            .unwrap_or_else(|| self.default_model.clone())
    }

    fn build_command(&self, request: &GenerateRequest, model: &str) -> CommandSpec {
        let prompt = flatten_prompt(&request.messages);
        let mut cmd = CommandSpec::new(&self.binary)
            .arg("--print")
            .arg("--output-format")
            .arg("json")
            .arg("--model")
            .arg(model);

        if let Some(structured) = &request.structured_output {
            cmd = cmd
                .arg("--output-schema")
                .arg(structured.schema.to_string());
        }
        if let Some(reasoning) = &request.reasoning {
            if reasoning.enabled {
                if let Some(level) = reasoning.thinking_level {
                    cmd = cmd.arg("--thinking").arg(format!("{level:?}").to_lowercase());
                } else if let Some(effort) = reasoning.effort {
                    cmd = cmd.arg("--thinking").arg(effort.as_str());
                }
            }
        }

        cmd.arg(prompt)
    }
}

#[async_trait]
impl ProviderAdapter for ClaudeCliAdapter {
    fn name(&self) -> &str {
        "claude-cli"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            streaming: false,
            tool_use: false,
            structured_output: true,
            multimodal: false,
            max_output_tokens: 8192,
        }
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, CouncilError> {
        let model = self.effective_model(&request);
        let cmd = self.build_command(&request, &model);

        let output = run_async(&cmd, DEFAULT_TIMEOUT)
            .await
            .map_err(|e| runner_error_to_provider_error(self.name(), e))?;

        let stdout = output.stdout_string();
        let raw: serde_json::Value = serde_json::from_str(&stdout).map_err(|e| {
            ProviderError::Parse {
                provider: self.name().to_string(),
                reason: e.to_string(),
            }
        })?;

        let text = raw
            .get("result")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or(stdout);

        Ok(GenerateResponse {
            text: Some(text.clone()),
            raw_content: text,
            tool_calls: Vec::new(),
            usage: Usage::default(),
            model,
            finish_reason: FinishReason::Stop,
            raw,
        })
    }

    async fn doctor(&self) -> DoctorReport {
        let start = Instant::now();
        if which(&self.binary).is_err() {
            return DoctorReport::failed(format!("`{}` not found on PATH", self.binary));
        }
        let probe = GenerateRequest::new(vec![Message::user("ping")]);
        match self.generate(probe).await {
            Ok(_) => DoctorReport::ok("claude CLI reachable", start.elapsed().as_millis() as u64),
            Err(e) => DoctorReport::failed(e.display_for_user()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ReasoningConfig, ReasoningEffort, StructuredOutputConfig};

    #[test]
    fn build_command_includes_model_and_schema_flags() {
        let adapter = ClaudeCliAdapter::new(None, "claude-opus-4".into(), None);
        let mut request = GenerateRequest::new(vec![Message::user("hi")]);
        request.structured_output = Some(StructuredOutputConfig {
            schema: serde_json::json!({"type": "object"}),
            name: "answer".into(),
            strict: true,
        });
        request.reasoning = Some(ReasoningConfig {
            enabled: true,
            effort: Some(ReasoningEffort::High),
            budget_tokens: None,
            thinking_level: None,
        });
        let cmd = adapter.build_command(&request, "claude-opus-4");
        assert!(cmd.args.iter().any(|a| a == "--output-schema"));
        assert!(cmd.args.iter().any(|a| a == "high"));
    }

    #[test]
    fn flatten_prompt_preserves_message_order() {
        let messages = vec![Message::system("be terse"), Message::user("hi")];
        let prompt = flatten_prompt(&messages);
        assert!(prompt.find("be terse").unwrap() < prompt.find("hi").unwrap());
    }
}
