//! strat-scan: batch-scan a rotating universe of tickers for STRAT setups
//! and publish `results.csv`, `results.json` and `context.csv`.
//!
//! Usage:
//!   cargo run -p strat-scan
//!   cargo run -p strat-scan -- --symbols AAPL MSFT GOOGL
//!   cargo run -p strat-scan -- --dry-run

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use market_data_client::BarFetcher;
use orchestrator::rows::{ContextRow, ResultRow};
use strat_core::Config;
use tokio::sync::Semaphore;
use universe_scheduler::{build_batch, load_offset, store_offset, Stock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "strat_scan=info".into()))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let dry_run = args.iter().any(|a| a == "--dry-run");
    let explicit_symbols: Option<Vec<String>> = args.iter().position(|a| a == "--symbols").map(|idx| {
        args[idx + 1..].iter().take_while(|a| !a.starts_with("--")).map(|s| s.to_uppercase()).collect()
    });

    let config = Config::from_env();

    let reference = match orchestrator::ReferenceData::load(&config.reference_dir) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "failed to load reference data, aborting");
            std::process::exit(1);
        }
    };

    let base_url = std::env::var("VENDOR_BASE_URL").unwrap_or_else(|_| "https://api.example-vendor.test".to_string());
    let fetcher = Arc::new(BarFetcher::new(base_url, &config.cache_dir, config.request_timeout_secs, config.intraday_fallback_cap_days));

    let now = Utc::now();
    let state_path = config.output_dir.join("state.json");
    let last_run_path = config.output_dir.join("last_run.json");

    if config.enable_run_gate && explicit_symbols.is_none() {
        if !orchestrator::should_run(&fetcher, &last_run_path, now).await {
            tracing::info!("run gate: no target timeframe has advanced, skipping run");
            std::process::exit(2);
        }
    }

    let symbols: Vec<String> = if let Some(symbols) = explicit_symbols {
        symbols
    } else {
        let offset = load_offset(&state_path);
        let stocks: Vec<Stock> = reference.stocks.clone();
        let batch = build_batch(&stocks, &reference.etfs, &config, offset);
        if let Err(e) = store_offset(&state_path, batch.next_offset) {
            tracing::warn!(error = %e, "failed to persist rotation offset");
        }
        batch.universe
    };

    let total_symbols = symbols.len();
    tracing::info!(total_symbols, dry_run, concurrency = config.concurrency_limit, "starting scan");

    let scan_time = now.to_rfc3339();
    let results = Arc::new(Mutex::new(Vec::<ResultRow>::new()));
    let contexts = Arc::new(Mutex::new(Vec::<ContextRow>::new()));
    let ok_symbols = Arc::new(AtomicU64::new(0));
    let skipped = Arc::new(AtomicU64::new(0));
    let rows_emitted = Arc::new(AtomicU64::new(0));
    let semaphore = Arc::new(Semaphore::new(config.concurrency_limit));
    let reference = Arc::new(reference);
    let config = Arc::new(config);

    let mut handles = Vec::with_capacity(total_symbols);
    for symbol in symbols {
        let fetcher = Arc::clone(&fetcher);
        let config = Arc::clone(&config);
        let reference = Arc::clone(&reference);
        let results = Arc::clone(&results);
        let contexts = Arc::clone(&contexts);
        let ok_symbols = Arc::clone(&ok_symbols);
        let skipped = Arc::clone(&skipped);
        let rows_emitted = Arc::clone(&rows_emitted);
        let semaphore = Arc::clone(&semaphore);
        let scan_time = scan_time.clone();

        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire().await.unwrap();
            match orchestrator::scan_symbol(&symbol, &fetcher, &config, &reference, &scan_time, now).await {
                Some(outcome) => {
                    ok_symbols.fetch_add(1, Ordering::Relaxed);
                    rows_emitted.fetch_add(outcome.result_rows.len() as u64, Ordering::Relaxed);
                    results.lock().unwrap().extend(outcome.result_rows);
                    contexts.lock().unwrap().push(outcome.context_row);
                }
                None => {
                    skipped.fetch_add(1, Ordering::Relaxed);
                }
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        let _ = handle.await;
    }

    let results = Arc::try_unwrap(results).unwrap().into_inner().unwrap();
    let contexts = Arc::try_unwrap(contexts).unwrap().into_inner().unwrap();

    if !dry_run {
        if let Err(e) = orchestrator::write_snapshot(&config.output_dir, &results, &contexts) {
            tracing::error!(error = %e, "failed to write snapshot");
            std::process::exit(1);
        }
        if config.enable_run_gate {
            if let Err(e) = orchestrator::record_run(&fetcher, &last_run_path, now).await {
                tracing::warn!(error = %e, "failed to record run-gate state");
            }
        }
    }

    eprintln!(
        "ok_symbols={} skipped={} rows_emitted={}",
        ok_symbols.load(Ordering::Relaxed),
        skipped.load(Ordering::Relaxed),
        rows_emitted.load(Ordering::Relaxed),
    );

    Ok(())
}
