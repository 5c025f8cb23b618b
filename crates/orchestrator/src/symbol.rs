use std::time::Duration;

use chrono::{DateTime, Utc};
use market_data_client::BarFetcher;
use strat_core::{Alignment, Bar, Config, Context, Interval, StratClass, Timeframe};
use strat_classify::{classify_frame, detect};
use timeframes::{last_closed, resample};
use universe_scheduler::bias_score;

use crate::enrich::enrich;
use crate::reference::ReferenceData;
use crate::rows::{ContextRow, ResultRow};

pub struct SymbolOutcome {
    pub result_rows: Vec<ResultRow>,
    pub context_row: ContextRow,
}

/// Per-symbol pipeline (C10): fetch both base intervals, build every target
/// timeframe, classify, score bias, detect setups, enrich and flatten to
/// output rows. Returns `None` when the symbol lacks sufficient history.
pub async fn scan_symbol(
    symbol: &str,
    fetcher: &BarFetcher,
    config: &Config,
    reference: &ReferenceData,
    scan_time: &str,
    now: DateTime<Utc>,
) -> Option<SymbolOutcome> {
    let daily_max_age = Duration::from_secs(*config.cache_ttl_secs.get(&Interval::Daily).unwrap_or(&(12 * 3600)) as u64);
    let hour1_max_age = Duration::from_secs(*config.cache_ttl_secs.get(&Interval::Hour1).unwrap_or(&(2 * 3600)) as u64);

    let daily = fetcher.load_ohlc(symbol, Interval::Daily, "5y", daily_max_age).await;
    if daily.len() < 50 {
        tracing::debug!(symbol, bars = daily.len(), "insufficient daily history, skipping");
        return None;
    }
    let hour1 = fetcher.load_ohlc(symbol, Interval::Hour1, "60d", hour1_max_age).await;

    let hour1_plausible = base_spacing_plausible(&hour1, 2 * 3600, true);
    let daily_plausible = base_spacing_plausible(&daily, 12 * 3600, false);

    let mut frames: Vec<(Timeframe, Vec<Bar>)> = Vec::new();
    for tf in Timeframe::TARGETS {
        let frame = match tf {
            Timeframe::Day => daily.clone(),
            Timeframe::Hour1 => hour1.clone(),
            Timeframe::Hour2 | Timeframe::Hour3 | Timeframe::Hour4 => {
                if hour1_plausible {
                    resample(&hour1, tf)
                } else {
                    Vec::new()
                }
            }
            Timeframe::Week | Timeframe::Month | Timeframe::Quarter | Timeframe::Year => {
                if daily_plausible {
                    resample(&daily, tf)
                } else {
                    Vec::new()
                }
            }
        };
        frames.push((tf, frame));
    }

    let mut context: Context = Context::new();
    let mut live: Context = Context::new();
    let mut classified: Vec<(Timeframe, Vec<Bar>, Vec<Option<StratClass>>)> = Vec::new();

    for (tf, frame) in frames {
        if frame.len() < 3 {
            continue;
        }
        let classes = classify_frame(&frame);
        if Timeframe::BIAS_TIMEFRAMES.contains(&tf) {
            if let Some(closed) = last_closed(tf, &frame, now) {
                if let Some(class) = classify_at(&frame, &classes, closed.timestamp) {
                    context.insert(tf, class);
                }
            }
            if let Some(last_class) = classes.last().copied().flatten() {
                live.insert(tf, last_class);
            }
        }
        classified.push((tf, frame, classes));
    }

    let score = bias_score(&context);
    let current_price = hour1.last().or(daily.last()).map(|b| b.close);
    let enrichment = enrich(symbol, reference);

    let mut result_rows = Vec::new();
    for (tf, frame, classes) in &classified {
        let setups = detect(frame, classes, *tf, now, config.enable_extended_setups);
        for setup in setups {
            let alignment = Alignment::classify(setup.direction, score);
            result_rows.push(ResultRow {
                scan_time: scan_time.to_string(),
                ticker: symbol.to_string(),
                chart_url: format!("https://finance.yahoo.com/quote/{symbol}/chart"),
                current_price: current_price.map(round2),
                tf: tf.as_str().to_string(),
                pattern: setup.pattern.clone(),
                setup: setup.setup.clone(),
                dir: setup.direction.as_str().to_string(),
                entry: setup.entry,
                stop: setup.stop,
                score,
                aligned: alignment.as_str().to_string(),
                last_strat: setup.last_class.as_str().to_string(),
                last_candle_type: candle_type_label(setup.last_class).to_string(),
                actionable: setup.actionable,
                note: setup.note.clone(),
                sector: enrichment.sector.clone(),
                industry: enrichment.industry.clone(),
                etfs: enrichment.etfs.clone(),
                etfs_pretty: enrichment.etfs_pretty.clone(),
                ctx_y: ctx_label(&context, Timeframe::Year),
                ctx_q: ctx_label(&context, Timeframe::Quarter),
                ctx_m: ctx_label(&context, Timeframe::Month),
                ctx_w: ctx_label(&context, Timeframe::Week),
                ctx_d: ctx_label(&context, Timeframe::Day),
            });
        }
    }

    let context_row = ContextRow {
        scan_time: scan_time.to_string(),
        ticker: symbol.to_string(),
        current_price: current_price.map(round2),
        ctx_y_closed: ctx_label(&context, Timeframe::Year),
        ctx_q_closed: ctx_label(&context, Timeframe::Quarter),
        ctx_m_closed: ctx_label(&context, Timeframe::Month),
        ctx_w_closed: ctx_label(&context, Timeframe::Week),
        ctx_d_closed: ctx_label(&context, Timeframe::Day),
        ctx_y_live: ctx_label(&live, Timeframe::Year),
        ctx_q_live: ctx_label(&live, Timeframe::Quarter),
        ctx_m_live: ctx_label(&live, Timeframe::Month),
        ctx_w_live: ctx_label(&live, Timeframe::Week),
        ctx_d_live: ctx_label(&live, Timeframe::Day),
        score,
        sector: enrichment.sector,
        industry: enrichment.industry,
    };

    Some(SymbolOutcome { result_rows, context_row })
}

fn ctx_label(context: &Context, tf: Timeframe) -> String {
    context.get(&tf).map(|c| c.as_str().to_string()).unwrap_or_default()
}

fn candle_type_label(class: StratClass) -> &'static str {
    match class {
        StratClass::Inside => "Inside Bar",
        StratClass::Outside => "Outside Bar",
        StratClass::DirectionalUp => "Directional Up",
        StratClass::DirectionalDown => "Directional Down",
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Finds the classification already computed for the bar at `timestamp`
/// (the last-closed bar resolved by the oracle).
fn classify_at(frame: &[Bar], classes: &[Option<StratClass>], timestamp: DateTime<Utc>) -> Option<StratClass> {
    frame.iter().position(|b| b.timestamp == timestamp).and_then(|idx| classes[idx])
}

/// C10 step 2's pre-derivation plausibility guard: a 60m base must have
/// median spacing no coarser than ~2h; a daily base must have median
/// spacing no finer than ~12h. Fewer than two bars is treated as plausible
/// (the downstream length check already gates the daily frame).
fn base_spacing_plausible(frame: &[Bar], threshold_secs: i64, must_be_at_most: bool) -> bool {
    if frame.len() < 2 {
        return true;
    }
    let mut gaps: Vec<i64> = frame.windows(2).map(|w| (w[1].timestamp - w[0].timestamp).num_seconds()).collect();
    gaps.sort_unstable();
    let median = gaps[gaps.len() / 2];
    if must_be_at_most {
        median <= threshold_secs
    } else {
        median >= threshold_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(ts: DateTime<Utc>) -> Bar {
        Bar { timestamp: ts, open: 1.0, high: 1.0, low: 1.0, close: 1.0, volume: 1.0 }
    }

    #[test]
    fn spacing_guard_accepts_hourly_base() {
        let frame = vec![bar(Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap()), bar(Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap())];
        assert!(base_spacing_plausible(&frame, 2 * 3600, true));
    }

    #[test]
    fn spacing_guard_rejects_daily_base_masquerading_as_hourly() {
        let frame = vec![bar(Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap()), bar(Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap())];
        assert!(!base_spacing_plausible(&frame, 2 * 3600, true));
    }

    #[test]
    fn candle_type_labels_are_human_readable() {
        assert_eq!(candle_type_label(StratClass::Inside), "Inside Bar");
        assert_eq!(candle_type_label(StratClass::DirectionalDown), "Directional Down");
    }
}
