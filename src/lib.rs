//! Council: a multi-model deliberation engine. Given a task and a named
//! role ("subagent"), it fans the task out to several LLM backends in
//! parallel, drives an adversarial critique round and a schema-validated
//! synthesis round, and returns a single [`CouncilResult`].
//!
//! This crate is a thin facade over the rest of the workspace: role
//! resolution is [`council_roles`], provider resolution is
//! [`council_providers`], the three-phase pipeline is
//! [`council_orchestrator`], and every phase's raw output is durably
//! recorded by [`council_artifacts`]. No CLI binary ships from here (out
//! of scope per spec.md §1); `Council` is a library entry point only.

mod result;
mod schema_store;

pub use result::{CouncilResult, RunOverrides};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use council_artifacts::{ArtifactStore, RunStatus};
use council_config::CouncilConfig;
use council_core::error::{ConfigError, CouncilError};
use council_orchestrator::{Orchestrator, RunConfig, estimate_total_usd};
use council_providers::{DoctorReport, ProviderRegistry};
use council_roles::RoleRegistry;
use tracing::{info, warn};

/// A stale `running` run older than this, found on open, is swept to
/// `timed_out` (§4.5 "background or on-open sweep"). One hour comfortably
/// exceeds the default 600s global run deadline.
const STALE_RUN_THRESHOLD: Duration = Duration::from_secs(3_600);

/// The single entry point: resolves a role, resolves providers, runs the
/// three-phase pipeline, and assembles the result. Holds no hidden global
/// state (§9) — everything it needs is either passed to `new` or read from
/// the config it was built with.
pub struct Council {
    config: CouncilConfig,
    role_registry: RoleRegistry,
    provider_registry: ProviderRegistry,
    store: Arc<ArtifactStore>,
    orchestrator: Orchestrator,
    schema_dir: std::path::PathBuf,
}

impl Council {
    /// Build a `Council` from a loaded configuration and a provider
    /// registry populated by the caller's explicit `register` calls.
    /// Opens (creating if necessary) the artifact store and runs one
    /// stale-run sweep.
    pub fn new(config: CouncilConfig, provider_registry: ProviderRegistry) -> Result<Self, CouncilError> {
        let store_root = config
            .store
            .root
            .clone()
            .unwrap_or_else(|| council_core::paths::default_store_root().to_string());
        let schema_dir = config
            .schema_dir
            .clone()
            .unwrap_or_else(|| council_core::paths::default_schema_dir().to_string());

        let store = Arc::new(ArtifactStore::open(&store_root)?);
        let _ = store.sweep(STALE_RUN_THRESHOLD)?;

        let role_registry = RoleRegistry::new(&config);
        let orchestrator = Orchestrator::new(store.clone());

        Ok(Self {
            config,
            role_registry,
            provider_registry,
            store,
            orchestrator,
            schema_dir: std::path::PathBuf::from(schema_dir),
        })
    }

    /// Run one deliberation: drafts, critique, synthesis (§4.6). Never
    /// panics and never returns `Err` — fatal conditions are represented
    /// in the returned `CouncilResult` with `success=false` (§7 "the
    /// result always returns").
    pub async fn run(
        &self,
        task: &str,
        subagent: &str,
        mode: Option<&str>,
        overrides: Option<RunOverrides>,
    ) -> CouncilResult {
        let overrides = overrides.unwrap_or_default();
        let run_id = match self.store.create_run() {
            Ok(run_id) => run_id,
            Err(error) => return self.failed_result(String::new(), subagent, mode, error),
        };

        let redacted_task = council_redaction::SecretRedactor::new().redact_content(task);
        info!(run_id = %run_id, subagent = %subagent, mode = ?mode, task = %redacted_task, "run started");

        let role = match self.role_registry.resolve(subagent, mode) {
            Ok(role) => role,
            Err(error) => {
                warn!(run_id = %run_id, subagent = %subagent, "role resolution failed");
                return self.fail_run(run_id, subagent, mode, error);
            }
        };

        let role_config = match self.config.roles.get(&role.name) {
            Some(role_config) => role_config,
            None => {
                let error: CouncilError = ConfigError::UnknownRole {
                    role: role.name.clone(),
                }
                .into();
                return self.fail_run(run_id, &role.name, mode, error);
            }
        };

        let providers = match self.provider_registry.resolve_for_role(
            &role.name,
            role_config,
            overrides.providers.as_deref(),
            overrides.strict,
        ) {
            Ok(providers) => providers,
            Err(error) => return self.fail_run(run_id, &role.name, mode, error),
        };

        let schema_stem = role.schema.clone().unwrap_or_else(|| role.name.clone());
        let schema = match schema_store::load(&self.schema_dir, &schema_stem) {
            Ok(schema) => schema,
            Err(error) => return self.fail_run(run_id, &role.name, mode, error),
        };

        let run_config = overrides.apply(RunConfig::default());

        let outcome = self
            .orchestrator
            .run(&run_id, task, &role, &providers, &schema, &run_config)
            .await;

        let estimated_cost_usd = estimate_total_usd(&outcome.usage, &run_config.cost_overrides);
        let artifact_ids = self.store.artifacts_for_run(&run_id).unwrap_or_default();

        CouncilResult {
            run_id,
            resolved_role: role.name,
            mode: role.mode,
            success: outcome.success(),
            synthesis: outcome.synthesis,
            drafts: outcome.drafts,
            critique: outcome.critique,
            timings: outcome.timings,
            usage: outcome.usage,
            estimated_cost_usd,
            validation_errors: outcome.validation_errors,
            retry_count: outcome.retry_count,
            degradation_events: outcome.degradation_events,
            errors: outcome.errors,
            artifact_ids,
        }
    }

    /// Side-effect-free (modulo network) health probe across every
    /// registered provider (§6 "`doctor() -> mapping{provider -> {ok,
    /// message, latency}}`").
    pub async fn doctor(&self) -> HashMap<String, DoctorReport> {
        let mut reports = HashMap::new();
        for (name, adapter) in self.provider_registry.iter() {
            reports.insert(name.to_string(), adapter.doctor().await);
        }
        reports
    }

    fn fail_run(
        &self,
        run_id: String,
        resolved_role: &str,
        mode: Option<&str>,
        error: CouncilError,
    ) -> CouncilResult {
        let _ = self.store.finish_run(&run_id, RunStatus::Failed);
        self.failed_result(run_id, resolved_role, mode, error)
    }

    fn failed_result(
        &self,
        run_id: String,
        resolved_role: &str,
        mode: Option<&str>,
        error: CouncilError,
    ) -> CouncilResult {
        CouncilResult {
            run_id,
            resolved_role: resolved_role.to_string(),
            mode: mode.map(str::to_string),
            success: false,
            synthesis: None,
            drafts: HashMap::new(),
            critique: None,
            timings: council_orchestrator::PhaseTiming::default(),
            usage: HashMap::new(),
            estimated_cost_usd: 0.0,
            validation_errors: Vec::new(),
            retry_count: 0,
            degradation_events: Vec::new(),
            errors: vec![error.display_for_user()],
            artifact_ids: Vec::new(),
        }
    }
}
