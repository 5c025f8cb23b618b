use strat_core::Config;

/// A symbol with its market capitalization, as read from the refreshed
/// symbols-with-market-cap reference table.
#[derive(Debug, Clone)]
pub struct Stock {
    pub symbol: String,
    pub market_cap: f64,
}

/// Result of building one run's batch: the symbols to scan, and the
/// rotation offset to persist for next run.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub universe: Vec<String>,
    pub next_offset: usize,
}

/// Priority pool + persisted round-robin rotation over the remainder, per
/// spec §4.9. `stocks` need not be pre-sorted; `etfs` is the full listed
/// ETF universe. `offset` is the rotation state read once at scheduler entry.
pub fn build_batch(stocks: &[Stock], etfs: &[String], config: &Config, offset: usize) -> Batch {
    let mut eligible: Vec<&Stock> = stocks.iter().filter(|s| s.market_cap >= config.min_market_cap).collect();
    eligible.sort_by(|a, b| b.market_cap.partial_cmp(&a.market_cap).unwrap_or(std::cmp::Ordering::Equal));

    let priority_cut = config.priority_top_stocks.min(eligible.len());
    let (priority_pool, remainder) = eligible.split_at(priority_cut);
    let priority_batch: Vec<String> = priority_pool.iter().take(config.priority_per_run).map(|s| s.symbol.clone()).collect();

    let expansion_pool = dedupe(remainder.iter().map(|s| s.symbol.clone()).chain(etfs.iter().cloned()));

    let n = expansion_pool.len();
    let k = config.rotation_per_run.min(n);
    let (rotation, next_offset) = if n == 0 {
        (Vec::new(), 0)
    } else {
        let start = offset % n;
        let end = start + k;
        let rotation = if end <= n {
            expansion_pool[start..end].to_vec()
        } else {
            let mut r = expansion_pool[start..].to_vec();
            r.extend_from_slice(&expansion_pool[..end - n]);
            r
        };
        (rotation, (start + k) % n)
    };

    let mut universe = dedupe(config.core_etfs.iter().cloned().chain(priority_batch).chain(rotation));
    universe.truncate(config.max_tickers_per_run);

    if config.dev_mode {
        universe.truncate(config.dev_tickers_limit);
    }

    Batch { universe, next_offset }
}

fn dedupe(iter: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    iter.filter(|s| seen.insert(s.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            dev_mode: false,
            dev_tickers_limit: 10,
            min_market_cap: 0.0,
            priority_top_stocks: 0,
            priority_per_run: 0,
            rotation_per_run: 2,
            max_tickers_per_run: 100,
            core_etfs: vec![],
            cache_ttl_secs: std::collections::HashMap::new(),
            request_timeout_secs: 20,
            intraday_fallback_cap_days: 60,
            universe_cache_ttl_secs: 86_400,
            enable_extended_setups: false,
            enable_run_gate: true,
            concurrency_limit: 12,
            cache_dir: std::path::PathBuf::from("cache/bars"),
            output_dir: std::path::PathBuf::from("cache/results"),
            reference_dir: std::path::PathBuf::from("cache/reference"),
        }
    }

    #[test]
    fn rotation_determinism_matches_worked_example() {
        let stocks: Vec<Stock> = Vec::new();
        let etfs: Vec<String> = ["A", "B", "C", "D", "E"].iter().map(|s| s.to_string()).collect();
        let cfg = base_config();

        let run1 = build_batch(&stocks, &etfs, &cfg, 4);
        assert_eq!(run1.universe, vec!["E", "A"]);
        assert_eq!(run1.next_offset, 1);

        let run2 = build_batch(&stocks, &etfs, &cfg, run1.next_offset);
        assert_eq!(run2.universe, vec!["B", "C"]);
        assert_eq!(run2.next_offset, 3);

        let run3 = build_batch(&stocks, &etfs, &cfg, run2.next_offset);
        assert_eq!(run3.universe, vec!["D", "E"]);
        assert_eq!(run3.next_offset, 0);
    }

    #[test]
    fn core_etfs_are_always_present() {
        let stocks: Vec<Stock> = Vec::new();
        let etfs: Vec<String> = ["A", "B"].iter().map(|s| s.to_string()).collect();
        let mut cfg = base_config();
        cfg.core_etfs = vec!["SPY".to_string()];
        let batch = build_batch(&stocks, &etfs, &cfg, 0);
        assert!(batch.universe.contains(&"SPY".to_string()));
    }

    #[test]
    fn full_rotation_cycle_visits_every_pool_symbol() {
        let stocks: Vec<Stock> = Vec::new();
        let etfs: Vec<String> = ["A", "B", "C", "D", "E", "F", "G"].iter().map(|s| s.to_string()).collect();
        let cfg = base_config();

        let mut offset = 0;
        let mut visited = std::collections::HashSet::new();
        let cycles = (etfs.len() as f64 / cfg.rotation_per_run as f64).ceil() as usize;
        for _ in 0..cycles {
            let batch = build_batch(&stocks, &etfs, &cfg, offset);
            visited.extend(batch.universe.clone());
            offset = batch.next_offset;
        }
        for e in &etfs {
            assert!(visited.contains(e), "{e} was never visited");
        }
    }

    #[test]
    fn priority_pool_draws_highest_market_cap_first() {
        let stocks = vec![
            Stock { symbol: "LOW".to_string(), market_cap: 20.0 },
            Stock { symbol: "HIGH".to_string(), market_cap: 100.0 },
            Stock { symbol: "MID".to_string(), market_cap: 50.0 },
        ];
        let mut cfg = base_config();
        cfg.priority_top_stocks = 1;
        cfg.priority_per_run = 1;
        cfg.rotation_per_run = 0;
        let batch = build_batch(&stocks, &[], &cfg, 0);
        assert_eq!(batch.universe, vec!["HIGH"]);
    }

    #[test]
    fn ineligible_stocks_are_excluded() {
        let stocks = vec![
            Stock { symbol: "TINY".to_string(), market_cap: 1.0 },
            Stock { symbol: "BIG".to_string(), market_cap: 1_000_000.0 },
        ];
        let mut cfg = base_config();
        cfg.min_market_cap = 1000.0;
        cfg.priority_top_stocks = 10;
        cfg.priority_per_run = 10;
        let batch = build_batch(&stocks, &[], &cfg, 0);
        assert!(!batch.universe.iter().any(|s| s == "TINY"));
    }
}
