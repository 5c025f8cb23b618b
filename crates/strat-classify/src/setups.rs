use chrono::{DateTime, Utc};
use strat_core::{Bar, Direction, StratClass, Setup, Timeframe};
use timeframes::last_closed_index;

/// Emit two-bar "NEXT" setups on the last closed pair of `frame` for one
/// timeframe. `classes[i]` must be the classification of `frame[i]`
/// (`None` for index 0). Preconditions: `frame.len() >= 3`.
pub fn detect(frame: &[Bar], classes: &[Option<StratClass>], tf: Timeframe, now: DateTime<Utc>, enable_extended: bool) -> Vec<Setup> {
    if frame.len() < 3 {
        return Vec::new();
    }

    let last_offset = last_closed_index(tf, frame, now);
    let len = frame.len() as isize;
    let last_idx = (len + last_offset) as usize;
    if last_idx == 0 {
        return Vec::new();
    }
    let prev_idx = last_idx - 1;

    let (Some(prev_class), Some(last_class)) = (classes[prev_idx], classes[last_idx]) else {
        return Vec::new();
    };
    let prev = &frame[prev_idx];
    let last = &frame[last_idx];

    let mut setups = Vec::new();

    let noise_filtered = prev_class.is_noise_candidate() || last_class.is_noise_candidate();
    if noise_filtered {
        match last_class {
            StratClass::Inside => {
                setups.push(build(tf, prev, prev_class, last, last_class, Direction::Bull, last.high, last.low, "INSIDE_BREAK_UP", "Break above the inside bar's high"));
                setups.push(build(tf, prev, prev_class, last, last_class, Direction::Bear, last.low, last.high, "INSIDE_BREAK_DOWN", "Break below the inside bar's low"));
            }
            StratClass::Outside => {
                setups.push(build(tf, prev, prev_class, last, last_class, Direction::Bull, last.high, last.low, "OUTSIDE_BREAK_UP", "Continuation above the outside bar's high"));
                setups.push(build(tf, prev, prev_class, last, last_class, Direction::Bear, last.low, last.high, "OUTSIDE_BREAK_DOWN", "Continuation below the outside bar's low"));
            }
            StratClass::DirectionalUp if prev_class == StratClass::Inside => {
                setups.push(build(tf, prev, prev_class, last, last_class, Direction::Bear, last.low, last.high, "REVSTRAT_BEAR", "Reversal watch: failed break after an inside bar"));
            }
            StratClass::DirectionalDown if prev_class == StratClass::Inside => {
                setups.push(build(tf, prev, prev_class, last, last_class, Direction::Bull, last.high, last.low, "REVSTRAT_BULL", "Reversal watch: failed break after an inside bar"));
            }
            _ => {}
        }
    }

    if enable_extended {
        setups.extend(extended_cases(tf, prev, prev_class, last, last_class));
    }

    setups
}

/// Optional 2U-2D/2D-2U reversal and 2-2 continuation cases, disabled by
/// default behind `Config.enable_extended_setups`.
fn extended_cases(tf: Timeframe, prev: &Bar, prev_class: StratClass, last: &Bar, last_class: StratClass) -> Vec<Setup> {
    use StratClass::{DirectionalDown as D2, DirectionalUp as U2};
    match (prev_class, last_class) {
        (U2, D2) => vec![build(tf, prev, prev_class, last, last_class, Direction::Bear, last.low, last.high, "TWO_BAR_REVERSAL_BEAR", "Two-bar reversal after a directional-up/directional-down pair")],
        (D2, U2) => vec![build(tf, prev, prev_class, last, last_class, Direction::Bull, last.high, last.low, "TWO_BAR_REVERSAL_BULL", "Two-bar reversal after a directional-down/directional-up pair")],
        (U2, U2) => vec![build(tf, prev, prev_class, last, last_class, Direction::Bull, last.high, last.low, "TWO_BAR_CONTINUATION_BULL", "Continuation of a directional-up run")],
        (D2, D2) => vec![build(tf, prev, prev_class, last, last_class, Direction::Bear, last.low, last.high, "TWO_BAR_CONTINUATION_BEAR", "Continuation of a directional-down run")],
        _ => Vec::new(),
    }
}

#[allow(clippy::too_many_arguments)]
fn build(tf: Timeframe, prev: &Bar, prev_class: StratClass, last: &Bar, last_class: StratClass, direction: Direction, entry: f64, stop: f64, setup: &str, note: &str) -> Setup {
    Setup {
        tf,
        pattern: format!("{}-{}", prev_class.as_str(), last_class.as_str()),
        setup: setup.to_string(),
        direction,
        entry: round2(entry),
        stop: round2(stop),
        prev_timestamp: prev.timestamp,
        prev_class,
        prev_high: prev.high,
        prev_low: prev.low,
        last_timestamp: last.timestamp,
        last_class,
        last_high: last.high,
        last_low: last.low,
        actionable: true,
        note: note.to_string(),
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
