//! `CouncilResult` and the per-run override knobs accepted by
//! [`crate::Council::run`] (§4.7).

use std::collections::HashMap;
use std::time::Duration;

use council_orchestrator::{PhaseTiming, RunConfig};
use council_providers::Usage;

/// Caller-supplied overrides for a single run, layered on top of the
/// role's own configuration. `None` on any field means "use the role's
/// default".
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    /// Explicit provider list, bypassing the role's preferred/fallback
    /// resolution entirely (§4.2 point 1).
    pub providers: Option<Vec<String>>,
    /// Overrides `ProviderSelection::strict` for this run only.
    pub strict: Option<bool>,
    pub per_call_timeout: Option<Duration>,
    pub global_timeout: Option<Duration>,
    pub max_retries: Option<u32>,
    /// Overrides the role's degrade-on-partial-failure toggle.
    pub degrade: Option<bool>,
    pub critic_provider: Option<String>,
    pub synthesis_provider: Option<String>,
    pub cost_overrides: HashMap<String, council_orchestrator::CostWeights>,
}

impl RunOverrides {
    pub(crate) fn apply(&self, mut config: RunConfig) -> RunConfig {
        if let Some(timeout) = self.per_call_timeout {
            config = config.with_per_call_timeout(timeout);
        }
        if let Some(timeout) = self.global_timeout {
            config.global_timeout = timeout;
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(degrade) = self.degrade {
            config.degrade = degrade;
        }
        if let Some(provider) = self.critic_provider.clone() {
            config.critic_provider = Some(provider);
        }
        if let Some(provider) = self.synthesis_provider.clone() {
            config.synthesis_provider = Some(provider);
        }
        for (provider, weights) in &self.cost_overrides {
            config.cost_overrides.insert(provider.clone(), *weights);
        }
        config
    }
}

/// Outcome of one `Council::run` call (§4.7). Always returned — a fatal
/// condition sets `success=false` and populates `errors` rather than
/// raising (§7 "the result always returns").
#[derive(Debug, Clone)]
pub struct CouncilResult {
    pub run_id: String,
    pub resolved_role: String,
    pub mode: Option<String>,
    pub success: bool,
    /// Parsed, schema-validated synthesis output. `None` on any failure.
    pub synthesis: Option<serde_json::Value>,
    /// Raw per-provider draft text, keyed by provider name.
    pub drafts: HashMap<String, String>,
    pub critique: Option<String>,
    pub timings: PhaseTiming,
    pub usage: HashMap<String, Usage>,
    pub estimated_cost_usd: f64,
    pub validation_errors: Vec<String>,
    pub retry_count: u32,
    pub degradation_events: Vec<String>,
    pub errors: Vec<String>,
    /// Every artifact id recorded for this run, in append order, for
    /// audit lookups via `ArtifactStore::summary`.
    pub artifact_ids: Vec<String>,
}
