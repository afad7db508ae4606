//! The Artifact Store (§4.5): a durable, content-addressed record of every
//! phase's raw output, rooted at a [`SandboxRoot`] so no path derived from a
//! run id, artifact id, or content hash can ever resolve outside the store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use camino::Utf8PathBuf;
use chrono::Utc;
use council_core::atomic_write::write_file_atomic;
use council_core::error::{ArtifactError, CouncilError};
use council_core::paths::{SandboxError, SandboxRoot};
use council_redaction::SecretRedactor;
use uuid::Uuid;

use crate::hash::content_hash;
use crate::ledger;
use crate::model::{ArtifactRecord, Phase, RunRecord, RunStatus, SummaryTier};
use crate::summary;

/// A durable, content-addressed artifact store.
pub struct ArtifactStore {
    root: PathBuf,
    sandbox: SandboxRoot,
}

impl ArtifactStore {
    /// Open (creating if necessary) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, CouncilError> {
        let root = root.as_ref();
        council_core::paths::ensure_dir_all(root).map_err(|e| ArtifactError::WriteFailed {
            path: root.display().to_string(),
            reason: e.to_string(),
        })?;
        council_core::paths::ensure_dir_all(root.join("blobs")).map_err(|e| {
            ArtifactError::WriteFailed {
                path: root.join("blobs").display().to_string(),
                reason: e.to_string(),
            }
        })?;
        council_core::paths::ensure_dir_all(root.join("summaries")).map_err(|e| {
            ArtifactError::WriteFailed {
                path: root.join("summaries").display().to_string(),
                reason: e.to_string(),
            }
        })?;

        let sandbox = SandboxRoot::new_default(root).map_err(|e| sandbox_err(root, &e))?;

        Ok(Self {
            root: root.to_path_buf(),
            sandbox,
        })
    }

    /// Create a run, returning its id. Called once at facade entry (§4.6
    /// "A run is created on facade entry").
    pub fn create_run(&self) -> Result<String, CouncilError> {
        let run_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        ledger::append_line(
            &self.runs_path(),
            &RunRecord {
                run_id: run_id.clone(),
                status: RunStatus::Running,
                created_at: now,
                updated_at: now,
            },
        )?;
        Ok(run_id)
    }

    /// Mark a run's terminal status (`Completed` or `Failed`), called by the
    /// orchestrator once the run concludes.
    pub fn finish_run(&self, run_id: &str, status: RunStatus) -> Result<(), CouncilError> {
        let record = self.latest_run_record(run_id)?;
        ledger::append_line(
            &self.runs_path(),
            &RunRecord {
                run_id: run_id.to_string(),
                status,
                created_at: record.created_at,
                updated_at: Utc::now(),
            },
        )
    }

    /// Append a phase artifact, deduping the payload against any existing
    /// blob with the same SHA-256 hash.
    pub fn append(
        &self,
        run_id: &str,
        phase: Phase,
        producer: &str,
        payload: &str,
    ) -> Result<String, CouncilError> {
        // Touch the run first so an append against an unknown run fails
        // before any bytes are written.
        let record = self.latest_run_record(run_id)?;

        let payload = SecretRedactor::new().redact_content(payload);
        let hash = content_hash(&payload);
        self.write_blob_if_absent(&hash, &payload)?;

        let artifact_id = Uuid::new_v4().to_string();
        ledger::append_line(
            &self.artifacts_path(),
            &ArtifactRecord {
                artifact_id: artifact_id.clone(),
                run_id: run_id.to_string(),
                phase,
                producer: producer.to_string(),
                hash,
                tier: SummaryTier::Audit,
                created_at: Utc::now(),
            },
        )?;

        ledger::append_line(
            &self.runs_path(),
            &RunRecord {
                run_id: run_id.to_string(),
                status: record.status,
                created_at: record.created_at,
                updated_at: Utc::now(),
            },
        )?;

        Ok(artifact_id)
    }

    /// Fetch `tier`'s summary text for `artifact_id`. `Audit` returns the
    /// raw payload; the other tiers are generated on first request and
    /// cached so subsequent calls are a file read.
    pub fn summary(&self, artifact_id: &str, tier: SummaryTier) -> Result<String, CouncilError> {
        let record = self.find_artifact(artifact_id)?;
        let payload = self.read_blob(&record.hash)?;

        if tier == SummaryTier::Audit {
            return Ok(payload);
        }

        let cache_rel = format!("summaries/{artifact_id}-{}.txt", tier.as_str());
        let cache_path = self
            .sandbox
            .join(&cache_rel)
            .map_err(|e| sandbox_err(&cache_rel, &e))?;

        if cache_path.as_path().exists() {
            return std::fs::read_to_string(cache_path.as_path()).map_err(|e| {
                ArtifactError::WriteFailed {
                    path: cache_path.as_path().display().to_string(),
                    reason: e.to_string(),
                }
                .into()
            });
        }

        let generated = summary::generate(tier, &payload);
        let utf8_path = Utf8PathBuf::from_path_buf(cache_path.to_path_buf())
            .map_err(|p| ArtifactError::WriteFailed {
                path: p.display().to_string(),
                reason: "cache path is not valid UTF-8".to_string(),
            })?;
        write_file_atomic(&utf8_path, &generated).map_err(|e| ArtifactError::WriteFailed {
            path: utf8_path.to_string(),
            reason: e.to_string(),
        })?;

        Ok(generated)
    }

    /// Transition any `running` run whose ledger was last updated more than
    /// `stale_after` ago to `timed_out`, writing a synthetic failure
    /// artifact. Returns the ids of runs transitioned.
    pub fn sweep(&self, stale_after: std::time::Duration) -> Result<Vec<String>, CouncilError> {
        let records: Vec<RunRecord> = ledger::read_all(&self.runs_path())?;
        let mut latest: HashMap<String, RunRecord> = HashMap::new();
        for record in records {
            latest.insert(record.run_id.clone(), record);
        }

        let threshold = chrono::Duration::from_std(stale_after)
            .unwrap_or_else(|_| chrono::Duration::seconds(i64::MAX / 1_000));
        let now = Utc::now();
        let mut timed_out = Vec::new();

        for (run_id, record) in latest {
            if record.status != RunStatus::Running {
                continue;
            }
            if now.signed_duration_since(record.updated_at) <= threshold {
                continue;
            }

            ledger::append_line(
                &self.runs_path(),
                &RunRecord {
                    run_id: run_id.clone(),
                    status: RunStatus::TimedOut,
                    created_at: record.created_at,
                    updated_at: now,
                },
            )?;

            let artifact_id = Uuid::new_v4().to_string();
            let hash = content_hash(STALE_RUN_PAYLOAD);
            self.write_blob_if_absent(&hash, STALE_RUN_PAYLOAD)?;
            ledger::append_line(
                &self.artifacts_path(),
                &ArtifactRecord {
                    artifact_id,
                    run_id: run_id.clone(),
                    phase: Phase::Synthesis,
                    producer: "sweep".to_string(),
                    hash,
                    tier: SummaryTier::Audit,
                    created_at: now,
                },
            )?;

            timed_out.push(run_id);
        }

        Ok(timed_out)
    }

    /// All artifact ids recorded against `run_id`, in append order — the
    /// facade surfaces these as `CouncilResult.artifact_ids` for audit.
    pub fn artifacts_for_run(&self, run_id: &str) -> Result<Vec<String>, CouncilError> {
        let records: Vec<ArtifactRecord> = ledger::read_all(&self.artifacts_path())?;
        Ok(records
            .into_iter()
            .filter(|r| r.run_id == run_id)
            .map(|r| r.artifact_id)
            .collect())
    }

    fn latest_run_record(&self, run_id: &str) -> Result<RunRecord, CouncilError> {
        let records: Vec<RunRecord> = ledger::read_all(&self.runs_path())?;
        records
            .into_iter()
            .rev()
            .find(|r| r.run_id == run_id)
            .ok_or_else(|| {
                ArtifactError::RunNotFound {
                    run_id: run_id.to_string(),
                }
                .into()
            })
    }

    fn find_artifact(&self, artifact_id: &str) -> Result<ArtifactRecord, CouncilError> {
        let records: Vec<ArtifactRecord> = ledger::read_all(&self.artifacts_path())?;
        records
            .into_iter()
            .rev()
            .find(|r| r.artifact_id == artifact_id)
            .ok_or_else(|| {
                ArtifactError::ArtifactNotFound {
                    artifact_id: artifact_id.to_string(),
                }
                .into()
            })
    }

    fn write_blob_if_absent(&self, hash: &str, payload: &str) -> Result<(), CouncilError> {
        let blob_dir_rel = format!("blobs/{}", &hash[0..2]);
        council_core::paths::ensure_dir_all(self.root.join(&blob_dir_rel)).map_err(|e| {
            ArtifactError::WriteFailed {
                path: blob_dir_rel.clone(),
                reason: e.to_string(),
            }
        })?;

        let blob_rel = format!("{blob_dir_rel}/{hash}");
        let blob_path = self
            .sandbox
            .join(&blob_rel)
            .map_err(|e| sandbox_err(&blob_rel, &e))?;

        if blob_path.as_path().exists() {
            // Idempotent: identical content races safely (§5).
            return Ok(());
        }

        let utf8_path =
            Utf8PathBuf::from_path_buf(blob_path.to_path_buf()).map_err(|p| {
                ArtifactError::WriteFailed {
                    path: p.display().to_string(),
                    reason: "blob path is not valid UTF-8".to_string(),
                }
            })?;
        write_file_atomic(&utf8_path, payload).map_err(|e| ArtifactError::WriteFailed {
            path: utf8_path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    fn read_blob(&self, hash: &str) -> Result<String, CouncilError> {
        let blob_rel = format!("blobs/{}/{}", &hash[0..2], hash);
        let blob_path = self
            .sandbox
            .join(&blob_rel)
            .map_err(|e| sandbox_err(&blob_rel, &e))?;
        std::fs::read_to_string(blob_path.as_path()).map_err(|e| {
            ArtifactError::WriteFailed {
                path: blob_path.as_path().display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn runs_path(&self) -> PathBuf {
        self.root.join("runs.jsonl")
    }

    fn artifacts_path(&self) -> PathBuf {
        self.root.join("artifacts.jsonl")
    }
}

const STALE_RUN_PAYLOAD: &str = "run timed out: no update before the stale threshold elapsed";

fn sandbox_err(path: impl AsRef<Path>, err: &SandboxError) -> CouncilError {
    ArtifactError::PathEscape {
        path: format!("{}: {err}", path.as_ref().display()),
    }
    .into()
}
