use strat_core::{Bar, StratClass};

/// Assigns a classification to every bar from index 1 onward. The first bar
/// of a frame has no predecessor and is left unclassified.
///
/// Pure function of the current and immediately-previous bar's high/low;
/// robust to an exact tie (neither directional label fires unless the
/// inequality is strict).
pub fn classify_frame(frame: &[Bar]) -> Vec<Option<StratClass>> {
    let mut out = Vec::with_capacity(frame.len());
    if frame.is_empty() {
        return out;
    }
    out.push(None);
    for i in 1..frame.len() {
        out.push(Some(classify_bar(&frame[i - 1], &frame[i])));
    }
    out
}

/// Classify a single bar relative to its predecessor. Order matters: inside
/// and outside are checked before either directional case, matching the
/// source's if/elif precedence exactly.
pub fn classify_bar(prev: &Bar, curr: &Bar) -> StratClass {
    if curr.high <= prev.high && curr.low >= prev.low {
        StratClass::Inside
    } else if curr.high > prev.high && curr.low < prev.low {
        StratClass::Outside
    } else if curr.high > prev.high {
        StratClass::DirectionalUp
    } else {
        StratClass::DirectionalDown
    }
}
