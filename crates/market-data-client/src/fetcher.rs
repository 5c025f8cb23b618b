use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use strat_core::{Bar, Interval, ScanError};

use crate::cache::BarCache;

/// A single vendor-returned record before normalization. Vendors are
/// treated as opaque per spec (external interfaces §6): column headers may
/// be single- or hierarchical-level, and field names vary among a known
/// small set of synonyms, so every field accepts its common aliases.
#[derive(Debug, Deserialize)]
struct VendorRecord {
    #[serde(alias = "t", alias = "Date", alias = "Datetime")]
    timestamp: VendorTimestamp,
    #[serde(alias = "o", alias = "Open")]
    open: Option<f64>,
    #[serde(alias = "h", alias = "High")]
    high: Option<f64>,
    #[serde(alias = "l", alias = "Low")]
    low: Option<f64>,
    #[serde(alias = "c", alias = "Close")]
    close: Option<f64>,
    #[serde(alias = "v", alias = "Volume", default)]
    volume: Option<f64>,
}

/// Vendor timestamps arrive either as epoch millis or as an RFC3339 string,
/// depending on the feed; both are accepted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VendorTimestamp {
    Millis(i64),
    Text(String),
}

impl VendorTimestamp {
    fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            VendorTimestamp::Millis(ms) => DateTime::from_timestamp_millis(*ms),
            VendorTimestamp::Text(s) => DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// Timeout-bounded vendor fetch with an interval-aware fallback period
/// chain, backed by a disk cache. Never raises: every code path returns a
/// frame, possibly empty.
pub struct BarFetcher {
    client: reqwest::Client,
    base_url: String,
    cache: BarCache,
    request_timeout: Duration,
    intraday_fallback_cap_days: u32,
}

impl BarFetcher {
    pub fn new(base_url: impl Into<String>, cache_dir: impl Into<std::path::PathBuf>, request_timeout_secs: u64, intraday_fallback_cap_days: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            cache: BarCache::new(cache_dir),
            request_timeout: Duration::from_secs(request_timeout_secs),
            intraday_fallback_cap_days,
        }
    }

    /// `load_ohlc(symbol, interval, period_hint, max_age)` per spec §4.3.
    pub async fn load_ohlc(&self, symbol: &str, interval: Interval, period_hint: &str, max_age: Duration) -> Vec<Bar> {
        if let Some(frame) = self.cache.get(symbol, interval, max_age) {
            return frame;
        }

        let periods = self.fallback_periods(interval, period_hint);
        let mut result = Vec::new();
        for period in &periods {
            match self.fetch_once(symbol, interval, period).await {
                Ok(frame) if !frame.is_empty() => {
                    if interval == Interval::Hour1 && !spacing_is_plausible(&frame, Duration::from_secs(3600)) {
                        tracing::warn!(symbol, period, "vendor returned coarser-than-expected intraday bars, rejecting");
                        continue;
                    }
                    result = frame;
                    break;
                }
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(symbol, period, error = %e, "vendor fetch failed");
                    continue;
                }
            }
        }

        if result.is_empty() {
            if let Some(stale) = self.cache.stale_get(symbol, interval) {
                return stale;
            }
            return Vec::new();
        }

        self.cache.put(symbol, interval, &result);
        result
    }

    /// Never exceed 60 days (configurable) for intraday regardless of the
    /// caller's hint; a single attempt suffices for daily.
    fn fallback_periods(&self, interval: Interval, period_hint: &str) -> Vec<String> {
        match interval {
            Interval::Daily => vec![period_hint.to_string()],
            Interval::Hour1 => {
                let cap = self.intraday_fallback_cap_days;
                let hint_days: Option<u32> = period_hint.strip_suffix('d').and_then(|s| s.parse().ok());
                let mut chain = Vec::new();
                if let Some(days) = hint_days {
                    if days <= cap && ![60, 30, 7].contains(&days) {
                        chain.push(format!("{days}d"));
                    }
                }
                for standard in [cap.min(60), 30, 7] {
                    let p = format!("{standard}d");
                    if !chain.contains(&p) {
                        chain.push(p);
                    }
                }
                chain
            }
        }
    }

    async fn fetch_once(&self, symbol: &str, interval: Interval, period: &str) -> Result<Vec<Bar>, ScanError> {
        let url = format!("{}/aggregates?symbol={}&interval={}&period={}", self.base_url, symbol, interval.as_str(), period);
        let response = tokio::time::timeout(self.request_timeout, self.client.get(&url).send())
            .await
            .map_err(|_| ScanError::Fetch {
                symbol: symbol.to_string(),
                interval: interval.as_str().to_string(),
                reason: "request timed out".to_string(),
            })?
            .map_err(|e| ScanError::Fetch {
                symbol: symbol.to_string(),
                interval: interval.as_str().to_string(),
                reason: e.to_string(),
            })?;

        let records: Vec<VendorRecord> = response.json().await.map_err(|e| ScanError::Fetch {
            symbol: symbol.to_string(),
            interval: interval.as_str().to_string(),
            reason: e.to_string(),
        })?;

        Ok(normalize_records(records))
    }
}

/// Maps synonymous field names, coerces numerics, drops rows with NaN in
/// OHLC, sorts ascending, deduplicates on timestamp.
fn normalize_records(records: Vec<VendorRecord>) -> Vec<Bar> {
    let mut bars: Vec<Bar> = records
        .into_iter()
        .filter_map(|r| {
            let timestamp = r.timestamp.to_utc()?;
            let open = r.open?;
            let high = r.high?;
            let low = r.low?;
            let close = r.close?;
            if !(open.is_finite() && high.is_finite() && low.is_finite() && close.is_finite()) {
                return None;
            }
            Some(Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume: r.volume.unwrap_or(0.0),
            })
        })
        .collect();

    bars.sort_by_key(|b| b.timestamp);
    bars.dedup_by_key(|b| b.timestamp);
    bars
}

/// Guards against vendor silently returning coarser bars than requested:
/// rejects if the inferred median spacing exceeds 2x the expected interval.
fn spacing_is_plausible(frame: &[Bar], expected: Duration) -> bool {
    if frame.len() < 2 {
        return true;
    }
    let mut gaps: Vec<i64> = frame.windows(2).map(|w| (w[1].timestamp - w[0].timestamp).num_seconds()).collect();
    gaps.sort_unstable();
    let median = gaps[gaps.len() / 2];
    (median as f64) <= 2.0 * expected.as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar_at(hour: u32) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2026, 1, 5, hour, 0, 0).unwrap(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 1.0,
        }
    }

    #[test]
    fn spacing_accepts_matching_interval() {
        let frame = vec![bar_at(9), bar_at(10), bar_at(11)];
        assert!(spacing_is_plausible(&frame, Duration::from_secs(3600)));
    }

    #[test]
    fn spacing_rejects_coarser_than_double() {
        let frame = vec![bar_at(9), bar_at(13), bar_at(17)];
        assert!(!spacing_is_plausible(&frame, Duration::from_secs(3600)));
    }

    #[test]
    fn normalize_sorts_and_dedupes() {
        let records = vec![
            VendorRecord { timestamp: VendorTimestamp::Millis(2000), open: Some(1.0), high: Some(1.0), low: Some(1.0), close: Some(1.0), volume: Some(10.0) },
            VendorRecord { timestamp: VendorTimestamp::Millis(1000), open: Some(1.0), high: Some(1.0), low: Some(1.0), close: Some(1.0), volume: Some(10.0) },
            VendorRecord { timestamp: VendorTimestamp::Millis(1000), open: Some(1.0), high: Some(1.0), low: Some(1.0), close: Some(1.0), volume: Some(10.0) },
        ];
        let bars = normalize_records(records);
        assert_eq!(bars.len(), 2);
        assert!(bars[0].timestamp < bars[1].timestamp);
    }

    #[test]
    fn normalize_drops_rows_missing_ohlc() {
        let records = vec![VendorRecord { timestamp: VendorTimestamp::Millis(1000), open: None, high: Some(1.0), low: Some(1.0), close: Some(1.0), volume: None }];
        assert!(normalize_records(records).is_empty());
    }
}
