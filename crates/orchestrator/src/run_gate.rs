use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use market_data_client::BarFetcher;
use serde::{Deserialize, Serialize};
use strat_core::{Interval, ScanError, Timeframe};
use timeframes::{last_closed, resample};

const REFERENCE_SYMBOL: &str = "SPY";

#[derive(Debug, Default, Serialize, Deserialize)]
struct LastRun {
    last_closed: HashMap<String, DateTime<Utc>>,
}

/// Pre-flight check (C12): fetches the reference symbol's base data, derives
/// the target frames, and compares their last-closed timestamps against
/// `last_run.json`. Returns `true` when at least one timeframe has advanced
/// (or no state file exists yet) and the run should proceed.
pub async fn should_run(fetcher: &BarFetcher, state_path: &Path, now: DateTime<Utc>) -> bool {
    let Some(current) = reference_closed_timestamps(fetcher, now).await else {
        return true;
    };
    let previous = load(state_path).last_closed;

    current.iter().any(|(tf, ts)| previous.get(tf).map(|prev| prev < ts).unwrap_or(true))
}

/// Records the reference symbol's current last-closed timestamps after a
/// successful snapshot write.
pub async fn record_run(fetcher: &BarFetcher, state_path: &Path, now: DateTime<Utc>) -> Result<(), ScanError> {
    let Some(current) = reference_closed_timestamps(fetcher, now).await else {
        return Ok(());
    };
    store(state_path, &LastRun { last_closed: current })
}

async fn reference_closed_timestamps(fetcher: &BarFetcher, now: DateTime<Utc>) -> Option<HashMap<String, DateTime<Utc>>> {
    let daily = fetcher.load_ohlc(REFERENCE_SYMBOL, Interval::Daily, "1y", Duration::from_secs(12 * 3600)).await;
    if daily.len() < 3 {
        return None;
    }

    let mut out = HashMap::new();
    for tf in Timeframe::BIAS_TIMEFRAMES {
        let frame = if tf == Timeframe::Day { daily.clone() } else { resample(&daily, tf) };
        if let Some(bar) = last_closed(tf, &frame, now) {
            out.insert(tf.as_str().to_string(), bar.timestamp);
        }
    }
    Some(out)
}

fn load(path: &Path) -> LastRun {
    std::fs::read_to_string(path).ok().and_then(|raw| serde_json::from_str(&raw).ok()).unwrap_or_default()
}

fn store(path: &Path, state: &LastRun) -> Result<(), ScanError> {
    let body = serde_json::to_string_pretty(state).map_err(|e| ScanError::Snapshot(e.to_string()))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ScanError::Snapshot(e.to_string()))?;
    }
    let tmp: PathBuf = path.with_extension("tmp");
    std::fs::write(&tmp, &body).map_err(|e| ScanError::Snapshot(e.to_string()))?;
    std::fs::rename(&tmp, path).map_err(|e| ScanError::Snapshot(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn missing_state_file_defaults_to_empty() {
        let path = std::env::temp_dir().join("orchestrator-run-gate-missing.json");
        let _ = std::fs::remove_file(&path);
        assert!(load(&path).last_closed.is_empty());
    }

    #[test]
    fn round_trips_through_atomic_write() {
        let path = std::env::temp_dir().join("orchestrator-run-gate-roundtrip.json");
        let mut last_closed = HashMap::new();
        last_closed.insert("D".to_string(), Utc.with_ymd_and_hms(2026, 1, 1, 21, 0, 0).unwrap());
        store(&path, &LastRun { last_closed }).unwrap();
        let loaded = load(&path);
        assert_eq!(loaded.last_closed.len(), 1);
        std::fs::remove_file(&path).ok();
    }
}
