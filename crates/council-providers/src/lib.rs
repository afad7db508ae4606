//! Provider adapter contract and registry (§4.1, §4.2): a uniform
//! request/response shape over a heterogeneous set of LLM backends, plus
//! the registry that resolves which adapters a role should run on.

mod anthropic;
mod budgeted;
mod claude_cli;
mod cli_support;
mod gemini;
mod gemini_cli;
mod http_client;
mod openai_compatible;
mod registry;
mod types;

pub use anthropic::AnthropicAdapter;
pub use budgeted::{BudgetedAdapter, CostLedger, CostPerThousand};
pub use claude_cli::ClaudeCliAdapter;
pub use gemini::GeminiAdapter;
pub use gemini_cli::GeminiCliAdapter;
pub use openai_compatible::OpenAiCompatibleAdapter;
pub use registry::ProviderRegistry;
pub use types::{
    DoctorReport, FinishReason, GenerateDelta, GenerateRequest, GenerateResponse, Message,
    MessageRole, ModelOverrides, ProviderAdapter, ProviderCapabilities, ReasoningConfig,
    ReasoningEffort, StructuredOutputConfig, ThinkingLevel, Usage, clamp_budget_tokens,
    model_matches, resolve_model,
};
