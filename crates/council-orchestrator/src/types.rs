//! Orchestrator-local types: run configuration, phase outcomes, and the
//! shared progress snapshot a global-deadline cancellation reads from.

use std::collections::HashMap;
use std::time::Duration;

use council_providers::Usage;
use tokio_util::sync::CancellationToken;

use crate::cost::CostWeights;

/// Default per-call provider deadline (spec.md §5 "default 120 s").
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);
/// Hard cap on a per-call deadline (spec.md §5 "capped at 900 s").
pub const MAX_CALL_TIMEOUT: Duration = Duration::from_secs(900);
/// Default global run deadline, covering all three phases and every
/// synthesis retry collectively.
pub const DEFAULT_GLOBAL_TIMEOUT: Duration = Duration::from_secs(600);
/// Default bound on synthesis retries (spec.md §4.6 phase 3).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Per-run tunables (§6 "Subagent configuration format" + caller
/// overrides via `RunOverrides` at the facade layer).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub max_retries: u32,
    pub per_call_timeout: Duration,
    pub global_timeout: Duration,
    /// Continue past a partial draft failure as long as at least one draft
    /// succeeded (§4.6 phase 1, §8 "degradation").
    pub degrade: bool,
    /// Provider to use for the critique phase; defaults to the first
    /// resolved provider (the role's top preference) when unset.
    pub critic_provider: Option<String>,
    /// Provider to use for the synthesis phase; defaults to the first
    /// resolved provider when unset.
    pub synthesis_provider: Option<String>,
    pub cost_overrides: HashMap<String, CostWeights>,
    /// Lets a caller abort an in-flight run (§5 "Cancellation") without
    /// waiting for the global deadline. Never triggered on its own; the
    /// facade holds the paired `CancellationToken` and calls `.cancel()`.
    pub cancellation: CancellationToken,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            per_call_timeout: DEFAULT_CALL_TIMEOUT,
            global_timeout: DEFAULT_GLOBAL_TIMEOUT,
            degrade: true,
            critic_provider: None,
            synthesis_provider: None,
            cost_overrides: HashMap::new(),
            cancellation: CancellationToken::new(),
        }
    }
}

impl RunConfig {
    /// Clamp `per_call_timeout` into `[1s, MAX_CALL_TIMEOUT]`, matching
    /// spec.md §5's boundary on provider call deadlines.
    #[must_use]
    pub fn with_per_call_timeout(mut self, timeout: Duration) -> Self {
        self.per_call_timeout = timeout.clamp(Duration::from_secs(1), MAX_CALL_TIMEOUT);
        self
    }
}

/// Wall-clock duration of one phase, in milliseconds.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct PhaseTiming {
    pub draft_ms: u64,
    pub critique_ms: u64,
    pub synthesis_ms: u64,
}

/// Final status of a run, mirroring `council_artifacts::RunStatus` but
/// owned here so the orchestrator doesn't need a store-crate dependency
/// in its public return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcomeStatus {
    Completed,
    Failed,
    TimedOut,
}

/// Everything the facade needs to build a `CouncilResult` (§4.7).
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunOutcomeStatus,
    pub drafts: HashMap<String, String>,
    pub degradation_events: Vec<String>,
    pub critique: Option<String>,
    pub synthesis: Option<serde_json::Value>,
    pub validation_errors: Vec<String>,
    pub retry_count: u32,
    pub usage: HashMap<String, Usage>,
    pub timings: PhaseTiming,
    pub errors: Vec<String>,
}

impl RunOutcome {
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == RunOutcomeStatus::Completed && self.synthesis.is_some()
    }
}

/// Mutable snapshot the global-deadline race reads from if it fires before
/// the inner phase pipeline returns on its own (§5 "Cancellation").
#[derive(Debug, Clone, Default)]
pub(crate) struct RunProgress {
    pub drafts: HashMap<String, String>,
    pub degradation_events: Vec<String>,
    pub critique: Option<String>,
    pub usage: HashMap<String, Usage>,
    pub timings: PhaseTiming,
}
