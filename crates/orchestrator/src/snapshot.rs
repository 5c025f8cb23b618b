use std::path::{Path, PathBuf};

use strat_core::ScanError;

use crate::rows::{ContextRow, ResultRow};

/// Writes `results.csv`, `results.json` and `context.csv` atomically
/// (tmp-file then rename) so a reader never observes a half-written file.
pub fn write_snapshot(output_dir: &Path, results: &[ResultRow], contexts: &[ContextRow]) -> Result<(), ScanError> {
    std::fs::create_dir_all(output_dir).map_err(|e| ScanError::Snapshot(e.to_string()))?;

    write_csv(&output_dir.join("results.csv"), results)?;
    write_json(&output_dir.join("results.json"), results)?;
    write_csv(&output_dir.join("context.csv"), contexts)?;

    Ok(())
}

fn write_csv<T: serde::Serialize>(path: &Path, rows: &[T]) -> Result<(), ScanError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row).map_err(|e| ScanError::Snapshot(e.to_string()))?;
    }
    let body = writer.into_inner().map_err(|e| ScanError::Snapshot(e.to_string()))?;
    write_atomic(path, &body)
}

fn write_json<T: serde::Serialize>(path: &Path, rows: &[T]) -> Result<(), ScanError> {
    let body = serde_json::to_vec_pretty(rows).map_err(|e| ScanError::Snapshot(e.to_string()))?;
    write_atomic(path, &body)
}

fn write_atomic(path: &Path, body: &[u8]) -> Result<(), ScanError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ScanError::Snapshot(e.to_string()))?;
    }
    let tmp: PathBuf = path.with_extension("tmp");
    std::fs::write(&tmp, body).map_err(|e| ScanError::Snapshot(e.to_string()))?;
    std::fs::rename(&tmp, path).map_err(|e| ScanError::Snapshot(e.to_string()))?;
    Ok(())
}
