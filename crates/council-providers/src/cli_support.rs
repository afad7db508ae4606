//! Shared helpers for CLI-backed adapters (`claude_cli`, `gemini_cli`):
//! translating a [`RunnerError`] into the typed [`CouncilError`] the rest
//! of the system expects, and flattening a message list into a single
//! prompt string for CLIs with no native multi-turn flag.

use std::time::Duration;

use council_core::error::{CouncilError, ProviderError};
use council_runner::RunnerError;
use tracing::warn;

use crate::types::Message;

/// Map a subprocess-level failure to the provider error taxonomy (§7):
/// a timeout stays a timeout, a missing binary or non-zero exit is a
/// transport error, and non-UTF-8 output is a parse error.
pub(crate) fn runner_error_to_provider_error(provider: &str, err: RunnerError) -> CouncilError {
    match err {
        RunnerError::Timeout { timeout_seconds, .. } => ProviderError::Timeout {
            provider: provider.to_string(),
            duration: Duration::from_secs(timeout_seconds),
        }
        .into(),
        RunnerError::SpawnFailed { reason, .. } => {
            warn!(provider, reason, "failed to spawn CLI subprocess");
            ProviderError::Transport {
                provider: provider.to_string(),
                message: council_redaction::redact_error_message(&reason),
            }
            .into()
        }
        RunnerError::ProgramNotFound { program } => ProviderError::Transport {
            provider: provider.to_string(),
            message: format!("{program} not found on PATH"),
        }
        .into(),
        RunnerError::NonZeroExit { code, stderr, .. } => ProviderError::Transport {
            provider: provider.to_string(),
            message: council_redaction::redact_error_message(&format!(
                "exited with status {code:?}: {stderr}"
            )),
        }
        .into(),
        RunnerError::InvalidUtf8Output { program } => ProviderError::Parse {
            provider: provider.to_string(),
            reason: format!("{program} produced non-UTF-8 output"),
        }
        .into(),
    }
}

/// Flatten a message list into `[Role] content` blocks separated by blank
/// lines, for CLIs that take a single prompt argument rather than a
/// structured conversation.
pub(crate) fn flatten_prompt(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("[{:?}] {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageRole;

    #[test]
    fn timeout_maps_to_provider_timeout() {
        let err = runner_error_to_provider_error(
            "claude-cli",
            RunnerError::Timeout {
                program: "claude".to_string(),
                timeout_seconds: 30,
            },
        );
        assert!(matches!(
            err,
            CouncilError::Provider(ProviderError::Timeout { .. })
        ));
    }

    #[test]
    fn invalid_utf8_maps_to_parse_error() {
        let err = runner_error_to_provider_error(
            "gemini-cli",
            RunnerError::InvalidUtf8Output {
                program: "gemini".to_string(),
            },
        );
        assert!(matches!(
            err,
            CouncilError::Provider(ProviderError::Parse { .. })
        ));
    }

    #[test]
    fn flatten_prompt_preserves_message_order() {
        let messages = vec![
            Message::new(MessageRole::System, "be terse"),
            Message::user("hi"),
        ];
        let prompt = flatten_prompt(&messages);
        assert!(prompt.find("be terse").unwrap() < prompt.find("hi").unwrap());
    }
}
