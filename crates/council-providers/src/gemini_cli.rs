//! CLI-backed Gemini adapter: shells out to a locally installed `gemini`
//! binary, mirroring [`crate::claude_cli::ClaudeCliAdapter`]'s shape for the
//! Gemini CLI's own flag dialect.

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

pub struct GeminiCliAdapter {
    binary: String,
    default_model: String,
    model_override: Option<String>,
}

impl GeminiCliAdapter {
    pub fn new(
        binary: Option<String>,
        default_model: String,
        model_override: Option<String>,
    ) -> Self {
        Self {
            binary: binary.unwrap_or_else(|| "gemini".to_string()),
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
            .arg("--model")
            .arg(model)
            .arg("--output-format")
            .arg("json");

        if let Some(structured) = &request.structured_output {
            cmd = cmd
                .arg("--response-schema")
                .arg(structured.schema.to_string());
        }
        if let Some(reasoning) = &request.reasoning {
            if reasoning.enabled {
                if let Some(budget) = reasoning.budget_tokens {
                    cmd = cmd.arg("--thinking-budget").arg(budget.to_string());
                }
            }
        }

        cmd.arg("--prompt").arg(prompt)
    }
}

#[async_trait]
impl ProviderAdapter for GeminiCliAdapter {
    fn name(&self) -> &str {
        "gemini-cli"
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
            .get("response")
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
            Ok(_) => DoctorReport::ok("gemini CLI reachable", start.elapsed().as_millis() as u64),
            Err(e) => DoctorReport::failed(e.display_for_user()),
        }
    }
}
