use strat_core::{Context, Timeframe};

/// Weighted sum over Y/Q/M/W/D last-closed classifications. Symbol-level,
/// not per-setup: the same score decorates every setup emitted for a
/// symbol in a given run.
pub fn score(context: &Context) -> i32 {
    Timeframe::BIAS_TIMEFRAMES
        .iter()
        .map(|tf| context.get(tf).map(|class| tf.bias_weight() * class.sign()).unwrap_or(0))
        .sum()
}
