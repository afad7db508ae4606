//! Append-only JSON-lines ledgers, serialized per store root with an
//! advisory `fd-lock` (§5: "writes are serialized per run via a run-scoped
//! lock"). Both `runs.jsonl` and `artifacts.jsonl` share this helper; a
//! row's current state for a given key is whichever row was appended last.

use std::fs::{self, OpenOptions};
use std::path::Path;

use council_core::error::{ArtifactError, CouncilError};
use fd_lock::RwLock;
use serde::{Serialize, de::DeserializeOwned};

/// Append one JSON-encoded `row` as a line to the file at `path`, holding an
/// exclusive file-descriptor lock on a sibling `.lock` file for the
/// duration of the write so concurrent appenders from other processes never
/// interleave partial lines.
pub fn append_line<T: Serialize>(path: &Path, row: &T) -> Result<(), CouncilError> {
    let lock_path = lock_path_for(path);
    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .map_err(|e| ArtifactError::WriteFailed {
            path: lock_path.display().to_string(),
            reason: e.to_string(),
        })?;
    let mut rw_lock = RwLock::new(lock_file);
    let _guard = rw_lock.write().map_err(|e| ArtifactError::WriteFailed {
        path: lock_path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut line = serde_json::to_string(row).map_err(|e| ArtifactError::WriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ArtifactError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    use std::io::Write as _;
    file.write_all(line.as_bytes())
        .map_err(|e| ArtifactError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    file.sync_all().map_err(|e| ArtifactError::WriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

/// Read every row of a JSON-lines file, skipping blank trailing lines.
/// Returns an empty vec if the file doesn't exist yet.
pub fn read_all<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CouncilError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path).map_err(|e| ArtifactError::WriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).map_err(|e| {
                CouncilError::from(ArtifactError::WriteFailed {
                    path: path.display().to_string(),
                    reason: format!("corrupt ledger row: {e}"),
                })
            })
        })
        .collect()
}

fn lock_path_for(path: &Path) -> std::path::PathBuf {
    path.with_extension("lock")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Row {
        value: u32,
    }

    #[test]
    fn append_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.jsonl");

        append_line(&path, &Row { value: 1 }).unwrap();
        append_line(&path, &Row { value: 2 }).unwrap();

        let rows: Vec<Row> = read_all(&path).unwrap();
        assert_eq!(rows, vec![Row { value: 1 }, Row { value: 2 }]);
    }

    #[test]
    fn read_all_on_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.jsonl");
        let rows: Vec<Row> = read_all(&path).unwrap();
        assert!(rows.is_empty());
    }
}
