//! The three-phase Orchestrator (§4.6): parallel drafts, single-provider
//! adversarial critique, bounded-retry synthesis, all under a global
//! deadline with best-effort cancellation of outstanding provider calls.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Mutex;
use tracing::{info, warn};

use council_artifacts::{ArtifactStore, Phase as ArtifactPhase, RunStatus};
use council_core::error::{ConfigError, CouncilError, ProviderError};
use council_core::logging::phase_span;
use council_providers::{
    FinishReason, GenerateRequest, Message, ProviderAdapter, ReasoningConfig as AdapterReasoning,
    ReasoningEffort, StructuredOutputConfig, ThinkingLevel, Usage,
};
use council_roles::Role;
use council_schema::validate_against_schema;

use crate::cost::estimate_total_usd;
use crate::retry_prompt;
use crate::structured::transform_for_provider;
use crate::types::{PhaseTiming, RunConfig, RunOutcome, RunOutcomeStatus, RunProgress};

/// Drives one run's draft -> critique -> synthesis pipeline.
pub struct Orchestrator {
    store: Arc<ArtifactStore>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self { store }
    }

    /// Run the full pipeline for one task/role against the already-resolved
    /// provider list, under `run_id` (created by the caller so the facade
    /// can report it even on a fatal configuration error before this is
    /// reached). Never panics and never returns `Err`: fatal conditions are
    /// represented in the returned `RunOutcome` per spec.md §7 "the result
    /// always returns".
    pub async fn run(
        &self,
        run_id: &str,
        task: &str,
        role: &Role,
        providers: &[Arc<dyn ProviderAdapter>],
        schema: &serde_json::Value,
        config: &RunConfig,
    ) -> RunOutcome {
        let progress = Arc::new(Mutex::new(RunProgress::default()));
        let inner = self.run_phases(run_id, task, role, providers, schema, config, progress.clone());
        tokio::pin!(inner);

        tokio::select! {
            outcome = &mut inner => outcome,
            () = tokio::time::sleep(config.global_timeout) => {
                warn!(run_id = %run_id, "global deadline exceeded, cancelling outstanding calls");
                let _ = self.store.finish_run(run_id, RunStatus::TimedOut);
                let snapshot = progress.lock().await.clone();
                RunOutcome {
                    status: RunOutcomeStatus::TimedOut,
                    drafts: snapshot.drafts,
                    degradation_events: snapshot.degradation_events,
                    critique: snapshot.critique,
                    synthesis: None,
                    validation_errors: Vec::new(),
                    retry_count: 0,
                    usage: snapshot.usage,
                    timings: snapshot.timings,
                    errors: vec!["global deadline exceeded".to_string()],
                }
            }
            () = config.cancellation.cancelled() => {
                warn!(run_id = %run_id, "run cancelled by caller, salvaging partial progress");
                let _ = self.store.finish_run(run_id, RunStatus::TimedOut);
                let snapshot = progress.lock().await.clone();
                RunOutcome {
                    status: RunOutcomeStatus::TimedOut,
                    drafts: snapshot.drafts,
                    degradation_events: snapshot.degradation_events,
                    critique: snapshot.critique,
                    synthesis: None,
                    validation_errors: Vec::new(),
                    retry_count: 0,
                    usage: snapshot.usage,
                    timings: snapshot.timings,
                    errors: vec!["run cancelled by caller".to_string()],
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_phases(
        &self,
        run_id: &str,
        task: &str,
        role: &Role,
        providers: &[Arc<dyn ProviderAdapter>],
        schema: &serde_json::Value,
        config: &RunConfig,
        progress: Arc<Mutex<RunProgress>>,
    ) -> RunOutcome {
        let mut timings = PhaseTiming::default();
        let mut usage: HashMap<String, Usage> = HashMap::new();

        // Invalid reasoning configuration is a configuration error and fails
        // the run immediately, before any provider call (§7).
        if let Err(error) = adapter_reasoning(role) {
            let _ = self.store.finish_run(run_id, RunStatus::Failed);
            return RunOutcome {
                status: RunOutcomeStatus::Failed,
                drafts: HashMap::new(),
                degradation_events: Vec::new(),
                critique: None,
                synthesis: None,
                validation_errors: Vec::new(),
                retry_count: 0,
                usage,
                timings,
                errors: vec![error.display_for_user()],
            };
        }

        // Phase 1: parallel drafts.
        let draft_span = phase_span(run_id, "draft");
        let _enter = draft_span.enter();
        let started = Instant::now();
        let (drafts, failures) = self.run_drafts(run_id, task, role, providers, config).await;
        timings.draft_ms = started.elapsed().as_millis() as u64;
        drop(_enter);

        let degradation_events: Vec<String> = failures
            .iter()
            .map(|(provider, message)| format!("{provider}: {message}"))
            .collect();
        for event in &degradation_events {
            warn!(run_id = %run_id, degradation = %event, "draft failed, continuing");
        }

        for (provider, record) in &drafts {
            usage.insert(provider.clone(), record.1);
        }

        {
            let mut snapshot = progress.lock().await;
            snapshot.drafts = drafts.iter().map(|(k, v)| (k.clone(), v.0.clone())).collect();
            snapshot.degradation_events = degradation_events.clone();
            snapshot.usage = usage.clone();
            snapshot.timings = timings;
        }

        if drafts.is_empty() {
            let _ = self.store.finish_run(run_id, RunStatus::Failed);
            return RunOutcome {
                status: RunOutcomeStatus::Failed,
                drafts: HashMap::new(),
                degradation_events,
                critique: None,
                synthesis: None,
                validation_errors: Vec::new(),
                retry_count: 0,
                usage,
                timings,
                errors: vec!["zero drafts succeeded".to_string()],
            };
        }

        if !failures.is_empty() && !config.degrade {
            let _ = self.store.finish_run(run_id, RunStatus::Failed);
            return RunOutcome {
                status: RunOutcomeStatus::Failed,
                drafts: drafts.iter().map(|(k, v)| (k.clone(), v.0.clone())).collect(),
                degradation_events,
                critique: None,
                synthesis: None,
                validation_errors: Vec::new(),
                retry_count: 0,
                usage,
                timings,
                errors: vec!["draft failures occurred and degradation is disabled".to_string()],
            };
        }

        // Phase 2: single-provider adversarial critique.
        let critique_span = phase_span(run_id, "critique");
        let _enter = critique_span.enter();
        let started = Instant::now();
        let critic = select_provider(providers, config.critic_provider.as_deref());
        let critique_result = self.run_critique(run_id, task, role, critic, &drafts).await;
        timings.critique_ms = started.elapsed().as_millis() as u64;
        drop(_enter);

        let critique_text = match critique_result {
            Ok((text, call_usage)) => {
                usage
                    .entry(critic.name().to_string())
                    .and_modify(|u| accumulate(u, call_usage))
                    .or_insert(call_usage);
                text
            }
            Err(error) => {
                let _ = self.store.finish_run(run_id, RunStatus::Failed);
                return RunOutcome {
                    status: RunOutcomeStatus::Failed,
                    drafts: drafts.iter().map(|(k, v)| (k.clone(), v.0.clone())).collect(),
                    degradation_events,
                    critique: None,
                    synthesis: None,
                    validation_errors: Vec::new(),
                    retry_count: 0,
                    usage,
                    timings,
                    errors: vec![error.display_for_user()],
                };
            }
        };

        {
            let mut snapshot = progress.lock().await;
            snapshot.critique = Some(critique_text.clone());
            snapshot.usage = usage.clone();
            snapshot.timings = timings;
        }

        // Phase 3: synthesis with bounded retry.
        let synthesis_span = phase_span(run_id, "synthesis");
        let _enter = synthesis_span.enter();
        let started = Instant::now();
        let synthesizer = select_provider(providers, config.synthesis_provider.as_deref());
        let synth_result = self
            .run_synthesis(run_id, task, role, synthesizer, &drafts, &critique_text, schema, config)
            .await;
        timings.synthesis_ms = started.elapsed().as_millis() as u64;
        drop(_enter);

        let (status, synthesis, validation_errors, retry_count, errors) = match synth_result {
            Ok((value, call_usage, retries)) => {
                usage
                    .entry(synthesizer.name().to_string())
                    .and_modify(|u| accumulate(u, call_usage))
                    .or_insert(call_usage);
                (RunOutcomeStatus::Completed, Some(value), Vec::new(), retries, Vec::new())
            }
            Err(SynthesisFailure { errors: validation_errors, retries, message, call_usage }) => {
                if let Some(call_usage) = call_usage {
                    usage
                        .entry(synthesizer.name().to_string())
                        .and_modify(|u| accumulate(u, call_usage))
                        .or_insert(call_usage);
                }
                (RunOutcomeStatus::Failed, None, validation_errors, retries, vec![message])
            }
        };

        let _ = self.store.finish_run(
            run_id,
            if status == RunOutcomeStatus::Completed {
                RunStatus::Completed
            } else {
                RunStatus::Failed
            },
        );

        info!(
            run_id = %run_id,
            estimated_cost_usd = estimate_total_usd(&usage, &config.cost_overrides),
            "run finished"
        );

        RunOutcome {
            status,
            drafts: drafts.into_iter().map(|(k, v)| (k, v.0)).collect(),
            degradation_events,
            critique: Some(critique_text),
            synthesis,
            validation_errors,
            retry_count,
            usage,
            timings,
            errors,
        }
    }

    async fn run_drafts(
        &self,
        run_id: &str,
        task: &str,
        role: &Role,
        providers: &[Arc<dyn ProviderAdapter>],
        config: &RunConfig,
    ) -> (HashMap<String, (String, Usage)>, HashMap<String, String>) {
        // Reasoning was validated in `run_phases` before this is called.
        let reasoning = adapter_reasoning(role).unwrap_or(None);

        let mut pending = FuturesUnordered::new();
        for provider in providers {
            let provider = provider.clone();
            let request = draft_request(role, task, reasoning.clone());
            let per_call_timeout = config.per_call_timeout;
            pending.push(async move {
                let name = provider.name().to_string();
                let outcome = tokio::time::timeout(per_call_timeout, provider.generate(request)).await;
                (name, outcome)
            });
        }

        let mut drafts = HashMap::new();
        let mut failures = HashMap::new();
        while let Some((name, outcome)) = pending.next().await {
            match outcome {
                Ok(Ok(response)) => match response.text {
                    Some(text) => {
                        match self.store.append(run_id, ArtifactPhase::Draft, &name, &text) {
                            Ok(_artifact_id) => {
                                drafts.insert(name, (text, response.usage));
                            }
                            Err(error) => {
                                failures.insert(name, error.display_for_user());
                            }
                        }
                    }
                    None => {
                        failures.insert(name, "provider returned no text".to_string());
                    }
                },
                Ok(Err(error)) => {
                    failures.insert(name, error.display_for_user());
                }
                Err(_elapsed) => {
                    let timeout_error: CouncilError = ProviderError::Timeout {
                        provider: name.clone(),
                        duration: config.per_call_timeout,
                    }
                    .into();
                    failures.insert(name, timeout_error.display_for_user());
                }
            }
        }

        (drafts, failures)
    }

    async fn run_critique(
        &self,
        run_id: &str,
        task: &str,
        role: &Role,
        critic: &Arc<dyn ProviderAdapter>,
        drafts: &HashMap<String, (String, Usage)>,
    ) -> Result<(String, Usage), CouncilError> {
        let mut prompt = String::new();
        prompt.push_str("Original task:\n");
        prompt.push_str(task);
        prompt.push_str("\n\nDrafts under review:\n");
        for (provider, (text, _)) in drafts {
            prompt.push_str(&format!("\n--- draft by {provider} ---\n{text}\n"));
        }
        prompt.push_str(
            "\nYou are the Critic. Find at least one genuine flaw in the drafts above. \
             Attack the ideas, not the providers that produced them. If a draft truly has \
             no flaw, say PASS for that draft rather than manufacturing one.",
        );

        let request = GenerateRequest {
            messages: vec![Message::system(&role.system_prompt), Message::user(prompt)],
            model: role.models.get(critic.name()).cloned(),
            max_output_tokens: None,
            temperature: role.temperature,
            stream: false,
            structured_output: None,
            reasoning: adapter_reasoning(role)?,
            response_format: None,
        };

        let response = critic.generate(request).await?;
        let text = response
            .text
            .unwrap_or_else(|| response.raw_content.clone());
        self.store.append(run_id, ArtifactPhase::Critique, critic.name(), &text)?;
        Ok((text, response.usage))
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_synthesis(
        &self,
        run_id: &str,
        task: &str,
        role: &Role,
        synthesizer: &Arc<dyn ProviderAdapter>,
        drafts: &HashMap<String, (String, Usage)>,
        critique: &str,
        canonical_schema: &serde_json::Value,
        config: &RunConfig,
    ) -> Result<(serde_json::Value, Usage, u32), SynthesisFailure> {
        let schema_name = role.schema.as_deref().unwrap_or(role.name.as_str());
        let mut prior_text: Option<String> = None;
        let mut prior_errors: Vec<String> = Vec::new();
        let mut total_usage = Usage::default();
        let mut attempt_usage: Option<Usage> = None;

        for attempt in 0..=config.max_retries {
            let user_content = synthesis_prompt(task, drafts, critique, prior_text.as_deref(), &prior_errors);
            let structured_schema = transform_for_provider(synthesizer.name(), canonical_schema);
            let reasoning = match adapter_reasoning(role) {
                Ok(reasoning) => reasoning,
                Err(error) => {
                    return Err(SynthesisFailure {
                        errors: Vec::new(),
                        retries: attempt,
                        message: error.display_for_user(),
                        call_usage: attempt_usage,
                    });
                }
            };

            let request = GenerateRequest {
                messages: vec![Message::system(&role.system_prompt), Message::user(user_content)],
                model: role.models.get(synthesizer.name()).cloned(),
                max_output_tokens: None,
                temperature: role.temperature,
                stream: false,
                structured_output: Some(StructuredOutputConfig {
                    schema: structured_schema,
                    name: schema_name.to_string(),
                    strict: true,
                }),
                reasoning,
                response_format: None,
            };

            let response = match synthesizer.generate(request).await {
                Ok(response) => response,
                Err(error) => {
                    return Err(SynthesisFailure {
                        errors: Vec::new(),
                        retries: attempt,
                        message: error.display_for_user(),
                        call_usage: attempt_usage,
                    });
                }
            };

            accumulate(&mut total_usage, response.usage);
            attempt_usage = Some(total_usage);

            let raw_text = response
                .text
                .clone()
                .unwrap_or_else(|| response.raw_content.clone());
            let artifact_label = format!("{}-attempt-{attempt}", synthesizer.name());
            let _ = self.store.append(run_id, ArtifactPhase::Synthesis, &artifact_label, &raw_text);

            if response.finish_reason == FinishReason::Error {
                prior_errors = vec!["provider reported a generation error".to_string()];
                prior_text = Some(raw_text);
                continue;
            }

            let parsed: serde_json::Value = match serde_json::from_str(&raw_text) {
                Ok(value) => value,
                Err(parse_error) => {
                    prior_errors = vec![format!("response was not valid JSON: {parse_error}")];
                    prior_text = Some(raw_text);
                    continue;
                }
            };

            match validate_against_schema(canonical_schema, &parsed) {
                Ok(()) => {
                    return Ok((parsed, total_usage, attempt));
                }
                Err(CouncilError::Schema(schema_error)) => {
                    prior_errors = schema_error.validation_errors().to_vec();
                    prior_text = Some(raw_text);
                }
                Err(other) => {
                    return Err(SynthesisFailure {
                        errors: Vec::new(),
                        retries: attempt,
                        message: other.display_for_user(),
                        call_usage: attempt_usage,
                    });
                }
            }
        }

        Err(SynthesisFailure {
            errors: prior_errors,
            retries: config.max_retries,
            message: "synthesis exhausted retries without producing a valid response".to_string(),
            call_usage: attempt_usage,
        })
    }
}

struct SynthesisFailure {
    errors: Vec<String>,
    retries: u32,
    message: String,
    call_usage: Option<Usage>,
}

fn synthesis_prompt(
    task: &str,
    drafts: &HashMap<String, (String, Usage)>,
    critique: &str,
    prior_attempt: Option<&str>,
    prior_errors: &[String],
) -> String {
    if let Some(prior) = prior_attempt {
        return retry_prompt::build(prior, prior_errors);
    }

    let mut prompt = String::new();
    prompt.push_str("Task:\n");
    prompt.push_str(task);
    prompt.push_str("\n\nDrafts:\n");
    for (provider, (text, _)) in drafts {
        let findings_tier = first_n_lines(text, 20);
        prompt.push_str(&format!("\n--- {provider} ---\n{findings_tier}\n"));
    }
    prompt.push_str("\n\nCritique:\n");
    prompt.push_str(critique);
    prompt.push_str(
        "\n\nSynthesize a single answer that resolves the critique and validates against the \
         required schema. Respond with the JSON object only.",
    );
    prompt
}

fn first_n_lines(text: &str, n: usize) -> String {
    text.lines().take(n).collect::<Vec<_>>().join("\n")
}

fn draft_request(role: &Role, task: &str, reasoning: Option<AdapterReasoning>) -> GenerateRequest {
    GenerateRequest {
        messages: vec![Message::system(&role.system_prompt), Message::user(task)],
        model: None,
        max_output_tokens: None,
        temperature: role.temperature,
        stream: false,
        structured_output: None,
        reasoning,
        response_format: None,
    }
}

/// Convert the role's raw-string reasoning config into the adapter-facing
/// enum form, failing closed on an unrecognized effort/thinking-level
/// string (§7 "Configuration error ... invalid reasoning budget").
fn adapter_reasoning(role: &Role) -> Result<Option<AdapterReasoning>, CouncilError> {
    if !role.reasoning.enabled {
        return Ok(None);
    }

    let effort = match role.reasoning.effort.as_deref() {
        Some(raw) => Some(ReasoningEffort::parse(raw).ok_or_else(|| {
            ConfigError::InvalidReasoningBudget {
                provider: role.name.clone(),
                reason: format!("unrecognized reasoning effort '{raw}'"),
            }
        })?),
        None => None,
    };

    let thinking_level = match role.reasoning.thinking_level.as_deref() {
        Some(raw) => Some(ThinkingLevel::parse(raw).ok_or_else(|| {
            ConfigError::InvalidReasoningBudget {
                provider: role.name.clone(),
                reason: format!("unrecognized thinking level '{raw}'"),
            }
        })?),
        None => None,
    };

    Ok(Some(AdapterReasoning {
        enabled: true,
        effort,
        budget_tokens: role.reasoning.budget_tokens,
        thinking_level,
    }))
}

/// Pick the named provider if present among `providers`, otherwise the
/// first resolved provider (the role's top preference) — the default for
/// both the critique and synthesis phases per spec.md §4.6.
fn select_provider<'a>(
    providers: &'a [Arc<dyn ProviderAdapter>],
    preferred_name: Option<&str>,
) -> &'a Arc<dyn ProviderAdapter> {
    if let Some(name) = preferred_name {
        if let Some(found) = providers.iter().find(|p| p.name() == name) {
            return found;
        }
    }
    &providers[0]
}

fn accumulate(total: &mut Usage, next: Usage) {
    total.input_tokens += next.input_tokens;
    total.output_tokens += next.output_tokens;
    total.total_tokens += next.total_tokens;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesis_prompt_without_prior_lists_all_drafts() {
        let mut drafts = HashMap::new();
        drafts.insert(
            "anthropic".to_string(),
            ("draft text".to_string(), Usage::default()),
        );
        let prompt = synthesis_prompt("do the thing", &drafts, "looks fine", None, &[]);
        assert!(prompt.contains("do the thing"));
        assert!(prompt.contains("draft text"));
        assert!(prompt.contains("looks fine"));
    }

    #[test]
    fn synthesis_prompt_with_prior_embeds_retry_state() {
        let drafts = HashMap::new();
        let prompt = synthesis_prompt(
            "task",
            &drafts,
            "critique",
            Some("bad json"),
            &["missing field 'x'".to_string()],
        );
        assert!(prompt.contains("bad json"));
        assert!(prompt.contains("missing field 'x'"));
    }
}
