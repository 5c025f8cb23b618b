use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strat_core::ScanError;

/// Persisted rotation state: `state.json` under the run's output directory.
/// Read once at scheduler entry, written once at scheduler exit.
#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    offset: usize,
}

pub fn load_offset(path: &Path) -> usize {
    match std::fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str::<StateFile>(&raw).map(|s| s.offset).unwrap_or(0),
        Err(_) => 0,
    }
}

pub fn store_offset(path: &Path, offset: usize) -> Result<(), ScanError> {
    let state = StateFile { offset };
    let body = serde_json::to_string_pretty(&state).map_err(|e| ScanError::Snapshot(e.to_string()))?;
    write_atomic(path, &body)
}

fn write_atomic(path: &Path, body: &str) -> Result<(), ScanError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ScanError::Snapshot(e.to_string()))?;
    }
    let tmp: PathBuf = path.with_extension("tmp");
    std::fs::write(&tmp, body).map_err(|e| ScanError::Snapshot(e.to_string()))?;
    std::fs::rename(&tmp, path).map_err(|e| ScanError::Snapshot(e.to_string()))?;
    Ok(())
}
