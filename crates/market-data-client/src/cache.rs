use std::path::{Path, PathBuf};
use std::time::SystemTime;

use strat_core::{Bar, Interval};

/// Disk-backed TTL cache of normalized OHLCV frames, one file per
/// `(symbol, interval)`. Reads tolerate partial/corrupt files by returning
/// empty; writes are best-effort and atomic (write-then-rename).
pub struct BarCache {
    dir: PathBuf,
}

impl BarCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, symbol: &str, interval: Interval) -> PathBuf {
        let file_name = format!("{}_{}.json", sanitize(symbol), interval.as_str());
        self.dir.join(file_name)
    }

    /// Returns the cached frame iff the file exists and its age is within
    /// `max_age`. Any I/O or parse error is treated as a miss.
    pub fn get(&self, symbol: &str, interval: Interval, max_age: std::time::Duration) -> Option<Vec<Bar>> {
        let path = self.path_for(symbol, interval);
        if !self.is_fresh(&path, max_age) {
            return None;
        }
        self.read(&path)
    }

    /// Returns the cached frame regardless of freshness; used only as a
    /// last-resort fallback when a live fetch fails.
    pub fn stale_get(&self, symbol: &str, interval: Interval) -> Option<Vec<Bar>> {
        let path = self.path_for(symbol, interval);
        self.read(&path)
    }

    pub fn put(&self, symbol: &str, interval: Interval, frame: &[Bar]) {
        let path = self.path_for(symbol, interval);
        if let Err(e) = self.write(&path, frame) {
            tracing::debug!(symbol, interval = interval.as_str(), error = %e, "bar cache write failed");
        }
    }

    fn is_fresh(&self, path: &Path, max_age: std::time::Duration) -> bool {
        let Ok(meta) = std::fs::metadata(path) else {
            return false;
        };
        let Ok(modified) = meta.modified() else {
            return false;
        };
        match SystemTime::now().duration_since(modified) {
            Ok(age) => age <= max_age,
            Err(_) => true, // clock skew into the future: treat as fresh rather than miss
        }
    }

    fn read(&self, path: &Path) -> Option<Vec<Bar>> {
        let text = std::fs::read_to_string(path).ok()?;
        serde_json::from_str::<Vec<Bar>>(&text).ok()
    }

    fn write(&self, path: &Path, frame: &[Bar]) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_string(frame).unwrap_or_default();
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, path)
    }
}

/// Deterministic, filesystem-safe path component for a canonical symbol.
fn sanitize(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
