//! Row types for the run ledger and the artifact index (§4.5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which phase of a run an artifact belongs to (spec.md §3: "phase ∈
/// {draft, critique, synthesis}").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Draft,
    Critique,
    Synthesis,
}

impl Phase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Critique => "critique",
            Self::Synthesis => "synthesis",
        }
    }
}

/// Increasing-detail summary tiers (§4.5). `Audit` is the raw payload;
/// the rest are generated lazily and cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryTier {
    Gist,
    Findings,
    Actions,
    Rationale,
    Audit,
}

impl SummaryTier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gist => "gist",
            Self::Findings => "findings",
            Self::Actions => "actions",
            Self::Rationale => "rationale",
            Self::Audit => "audit",
        }
    }
}

/// A run's lifecycle status, tracked in `runs.jsonl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
    TimedOut,
}

/// One row of `runs.jsonl`. The ledger is append-only; a run's current
/// state is the most recently appended row for its `run_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of `artifacts.jsonl`. Several rows may reference the same
/// `hash` when payload bytes are identical (content-addressed dedup).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub artifact_id: String,
    pub run_id: String,
    pub phase: Phase,
    pub producer: String,
    pub hash: String,
    /// The tier this row's `hash` blob is stored at. Every artifact is
    /// appended as its full raw output, so this is always `Audit` at
    /// write time (§3 "payload bytes are immutable once stored; only
    /// summaries may be (re)generated") — the other tiers are derived
    /// from the `Audit` blob on demand and cached, never written as a
    /// separate row.
    pub tier: SummaryTier,
    pub created_at: DateTime<Utc>,
}
