use std::collections::HashMap;

use crate::types::Interval;

/// Every tunable the scan run needs, loaded once and threaded explicitly
/// into the scheduler and each component. No process-wide mutable state.
#[derive(Debug, Clone)]
pub struct Config {
    pub dev_mode: bool,
    pub dev_tickers_limit: usize,

    pub min_market_cap: f64,
    pub priority_top_stocks: usize,
    pub priority_per_run: usize,
    pub rotation_per_run: usize,
    pub max_tickers_per_run: usize,
    pub core_etfs: Vec<String>,

    pub cache_ttl_secs: HashMap<Interval, i64>,
    pub request_timeout_secs: u64,
    pub intraday_fallback_cap_days: u32,
    pub universe_cache_ttl_secs: i64,

    /// Gates the 2U-2D/2D-2U reversal and 2-2 continuation setup cases
    /// (spec's optional setup table); off by default.
    pub enable_extended_setups: bool,

    /// Gates the pre-flight short-circuit that skips a whole run when no
    /// timeframe has produced a new closed bar since the last run.
    pub enable_run_gate: bool,

    pub concurrency_limit: usize,

    pub cache_dir: std::path::PathBuf,
    pub output_dir: std::path::PathBuf,
    pub reference_dir: std::path::PathBuf,
}

impl Config {
    /// Load configuration from environment variables (via `.env` if present),
    /// falling back to documented defaults for anything unset.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut cache_ttl_secs = HashMap::new();
        cache_ttl_secs.insert(Interval::Daily, env_i64("CACHE_TTL_DAILY_SECS", 12 * 3600));
        cache_ttl_secs.insert(Interval::Hour1, env_i64("CACHE_TTL_HOUR1_SECS", 2 * 3600));

        Config {
            dev_mode: env_bool("DEV_MODE", true),
            dev_tickers_limit: env_usize("DEV_TICKERS_LIMIT", 10),

            min_market_cap: env_f64("MIN_MARKET_CAP", 10_000_000.0),
            priority_top_stocks: env_usize("PRIORITY_TOP_STOCKS", 200),
            priority_per_run: env_usize("PRIORITY_PER_RUN", 50),
            rotation_per_run: env_usize("ROTATION_PER_RUN", 150),
            max_tickers_per_run: env_usize("MAX_TICKERS_PER_RUN", 300),
            core_etfs: env_list(
                "CORE_ETFS",
                &["SPY", "QQQ", "IWM", "DIA", "XLK", "XLF", "XLE", "XLV", "SMH"],
            ),

            cache_ttl_secs,
            request_timeout_secs: env_u64("REQUEST_TIMEOUT_SEC", 20),
            intraday_fallback_cap_days: env_u32("INTRADAY_FALLBACK_CAP_DAYS", 60),
            universe_cache_ttl_secs: env_i64("UNIVERSE_CACHE_TTL_SEC", 24 * 3600),

            enable_extended_setups: env_bool("ENABLE_EXTENDED_SETUPS", false),
            enable_run_gate: env_bool("ENABLE_RUN_GATE", true),

            concurrency_limit: env_usize("CONCURRENCY_LIMIT", 12),

            cache_dir: env_path("CACHE_DIR", "cache/bars"),
            output_dir: env_path("OUTPUT_DIR", "cache/results"),
            reference_dir: env_path("REFERENCE_DIR", "cache/reference"),
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_path(key: &str, default: &str) -> std::path::PathBuf {
    std::env::var(key)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from(default))
}

fn env_list(key: &str, default: &[&str]) -> Vec<String> {
    match std::env::var(key) {
        Ok(v) => v.split(',').map(|s| s.trim().to_uppercase()).filter(|s| !s.is_empty()).collect(),
        Err(_) => default.iter().map(|s| s.to_string()).collect(),
    }
}
