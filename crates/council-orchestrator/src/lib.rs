//! The three-phase Orchestrator (§4.6): parallel drafts, a single-provider
//! adversarial critique, and bounded-retry synthesis, run under a global
//! deadline with best-effort cancellation of outstanding provider calls.
//!
//! This crate owns only the *pipeline*; provider resolution is the
//! registry's job (`council-providers`), role composition is the role
//! registry's job (`council-roles`), and schema loading is the facade's
//! job (`council`, the root crate) — the orchestrator is handed an
//! already-resolved [`Role`](council_roles::Role), provider list, and
//! canonical schema `Value`.

mod cost;
mod orchestrator;
mod retry_prompt;
mod structured;
mod types;

pub use cost::{CostWeights, DEFAULT_COST_PER_1K, estimate_total_usd};
pub use orchestrator::Orchestrator;
pub use types::{
    DEFAULT_CALL_TIMEOUT, DEFAULT_GLOBAL_TIMEOUT, DEFAULT_MAX_RETRIES, MAX_CALL_TIMEOUT,
    PhaseTiming, RunConfig, RunOutcome, RunOutcomeStatus,
};
