use chrono::{DateTime, Datelike, Duration, TimeZone, Utc, Weekday};
use chrono_tz::America::New_York;
use strat_core::{Bar, Timeframe};

/// Aggregate base-interval bars into derived timeframe bars, right-labeled,
/// right-closed. Returns an empty frame rather than fabricating bars when
/// the target would down-sample finer than the base data.
pub fn resample(frame: &[Bar], target: Timeframe) -> Vec<Bar> {
    if frame.is_empty() {
        return Vec::new();
    }

    match target {
        Timeframe::Hour2 => resample_intraday(frame, 2),
        Timeframe::Hour3 => resample_intraday(frame, 3),
        Timeframe::Hour4 => resample_intraday(frame, 4),
        Timeframe::Week => resample_calendar(frame, week_ending_friday),
        Timeframe::Month => resample_calendar(frame, month_end),
        Timeframe::Quarter => resample_calendar(frame, quarter_end),
        Timeframe::Year => resample_calendar(frame, year_end),
        Timeframe::Hour1 | Timeframe::Day => frame.to_vec(), // direct pass, not a derivation
    }
}

/// 2H/3H/4H from 60m, aligned to start-of-day + 30-minute offset (the
/// market's intraday grid: 9:30, 10:30, ... are bar starts).
fn resample_intraday(frame: &[Bar], hours: i64) -> Vec<Bar> {
    let base_spacing = median_spacing_secs(frame);
    let target_spacing = hours * 3600;
    if base_spacing >= target_spacing {
        tracing::warn!(hours, base_spacing, "resample would down-sample intraday data, returning empty");
        return Vec::new();
    }

    let step_secs = hours * 3600;
    let mut buckets: Vec<(DateTime<Utc>, Vec<&Bar>)> = Vec::new();

    for bar in frame {
        let local = bar.timestamp.with_timezone(&New_York);
        let day_start = local.date_naive().and_hms_opt(0, 0, 0).unwrap();
        let anchor = New_York.from_local_datetime(&day_start).unwrap().with_timezone(&Utc) + Duration::minutes(30);
        let elapsed = (bar.timestamp - anchor).num_seconds();
        let bucket_index = div_ceil(elapsed, step_secs);
        let bucket_end = anchor + Duration::seconds(step_secs * bucket_index);

        match buckets.last_mut() {
            Some((label, bars)) if *label == bucket_end => bars.push(bar),
            _ => buckets.push((bucket_end, vec![bar])),
        }
    }

    buckets.into_iter().map(|(label, bars)| aggregate(label, &bars)).collect()
}

/// Right-closed bucket assignment: a value exactly on a bucket edge belongs
/// to the bucket ending there, matching `closed="right"`.
fn div_ceil(a: i64, b: i64) -> i64 {
    let d = a.div_euclid(b);
    let r = a.rem_euclid(b);
    if r > 0 { d + 1 } else { d }
}

fn resample_calendar(frame: &[Bar], label_fn: fn(DateTime<Utc>) -> DateTime<Utc>) -> Vec<Bar> {
    let mut buckets: Vec<(DateTime<Utc>, Vec<&Bar>)> = Vec::new();
    for bar in frame {
        let label = label_fn(bar.timestamp);
        match buckets.last_mut() {
            Some((l, bars)) if *l == label => bars.push(bar),
            _ => buckets.push((label, vec![bar])),
        }
    }
    buckets.into_iter().map(|(label, bars)| aggregate(label, &bars)).collect()
}

fn aggregate(label: DateTime<Utc>, bars: &[&Bar]) -> Bar {
    Bar {
        timestamp: label,
        open: bars.first().unwrap().open,
        high: bars.iter().map(|b| b.high).fold(f64::MIN, f64::max),
        low: bars.iter().map(|b| b.low).fold(f64::MAX, f64::min),
        close: bars.last().unwrap().close,
        volume: bars.iter().map(|b| b.volume).sum(),
    }
}

fn median_spacing_secs(frame: &[Bar]) -> i64 {
    if frame.len() < 2 {
        return i64::MAX;
    }
    let mut gaps: Vec<i64> = frame.windows(2).map(|w| (w[1].timestamp - w[0].timestamp).num_seconds()).collect();
    gaps.sort_unstable();
    gaps[gaps.len() / 2]
}

fn week_ending_friday(ts: DateTime<Utc>) -> DateTime<Utc> {
    let local = ts.with_timezone(&New_York);
    let dow = local.weekday().num_days_from_monday() as i64; // Mon=0 .. Sun=6
    let days_to_friday = (4 - dow).max(0); // Mon..Fri map to >=0; Sat/Sun roll to next week's Friday
    let days_to_friday = if dow > 4 { 4 + 7 - dow } else { days_to_friday };
    let friday = local.date_naive() + Duration::days(days_to_friday);
    New_York.from_local_datetime(&friday.and_hms_opt(0, 0, 0).unwrap()).unwrap().with_timezone(&Utc)
}

fn month_end(ts: DateTime<Utc>) -> DateTime<Utc> {
    let local = ts.with_timezone(&New_York);
    let (year, month) = (local.year(), local.month());
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let first_of_next = chrono::NaiveDate::from_ymd_opt(next_year, next_month, 1).unwrap();
    let last_day = first_of_next - Duration::days(1);
    New_York.from_local_datetime(&last_day.and_hms_opt(0, 0, 0).unwrap()).unwrap().with_timezone(&Utc)
}

fn quarter_end(ts: DateTime<Utc>) -> DateTime<Utc> {
    let local = ts.with_timezone(&New_York);
    let quarter_end_month = ((local.month0() / 3) + 1) * 3; // 1-indexed 3/6/9/12
    let (next_year, next_month) = if quarter_end_month == 12 { (local.year() + 1, 1) } else { (local.year(), quarter_end_month + 1) };
    let first_of_next = chrono::NaiveDate::from_ymd_opt(next_year, next_month, 1).unwrap();
    let last_day = first_of_next - Duration::days(1);
    New_York.from_local_datetime(&last_day.and_hms_opt(0, 0, 0).unwrap()).unwrap().with_timezone(&Utc)
}

fn year_end(ts: DateTime<Utc>) -> DateTime<Utc> {
    let local = ts.with_timezone(&New_York);
    New_York
        .from_local_datetime(&chrono::NaiveDate::from_ymd_opt(local.year(), 12, 31).unwrap().and_hms_opt(0, 0, 0).unwrap())
        .unwrap()
        .with_timezone(&Utc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hourly_bar(day: u32, hour: u32, minute: u32, close: f64) -> Bar {
        Bar {
            timestamp: New_York
                .with_ymd_and_hms(2026, 1, day, hour, minute, 0)
                .unwrap()
                .with_timezone(&Utc),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 100.0,
        }
    }

    #[test]
    fn intraday_resample_preserves_high_low_bounds() {
        // Monday Jan 5 2026: 9:30 is the lone member of the (7:30,9:30]
        // bucket; 10:30 and 11:30 share the (9:30,11:30] bucket (right-closed).
        let frame = vec![hourly_bar(5, 10, 30, 10.0), hourly_bar(5, 11, 30, 11.0)];
        let out = resample(&frame, Timeframe::Hour2);
        assert_eq!(out.len(), 1);
        assert!(out[0].high >= out[0].open.max(out[0].close));
        assert!(out[0].low <= out[0].open.min(out[0].close));
    }

    #[test]
    fn intraday_resample_does_not_strand_trailing_bar() {
        // 14:30 and 15:30 must combine into the (13:30,15:30] bucket rather
        // than 15:30 landing alone in a bucket labeled 17:30.
        let frame = vec![hourly_bar(5, 14, 30, 10.0), hourly_bar(5, 15, 30, 11.0)];
        let out = resample(&frame, Timeframe::Hour2);
        assert_eq!(out.len(), 1);
        let label_local = out[0].timestamp.with_timezone(&New_York);
        assert_eq!(label_local.time(), chrono::NaiveTime::from_hms_opt(15, 30, 0).unwrap());
    }

    #[test]
    fn intraday_resample_splits_lone_opening_bar() {
        // The 9:30 bar is the right-closed bucket's own edge, so it must not
        // merge with 10:30 (a separate, later bucket).
        let frame = vec![hourly_bar(5, 9, 30, 10.0), hourly_bar(5, 10, 30, 11.0)];
        let out = resample(&frame, Timeframe::Hour2);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn intraday_downsample_guard_returns_empty() {
        // A single far-apart pair of bars has a huge median spacing; asking
        // for a finer-than-input bucket should yield nothing.
        let frame = vec![hourly_bar(5, 9, 30, 10.0), hourly_bar(6, 9, 30, 11.0)];
        let out = resample(&frame, Timeframe::Hour2);
        assert!(out.is_empty());
    }

    #[test]
    fn weekly_labels_land_on_friday() {
        let daily = |day: u32, close: f64| Bar {
            timestamp: New_York.with_ymd_and_hms(2026, 1, day, 0, 0, 0).unwrap().with_timezone(&Utc),
            open: close,
            high: close,
            low: close,
            close,
            volume: 10.0,
        };
        let frame = vec![daily(5, 1.0), daily(6, 2.0), daily(9, 3.0)];
        let out = resample(&frame, Timeframe::Week);
        assert_eq!(out.len(), 1);
        let label_local = out[0].timestamp.with_timezone(&New_York);
        assert_eq!(label_local.weekday(), Weekday::Fri);
    }

    #[test]
    fn quarterly_label_lands_on_quarter_end_not_prior_month() {
        let daily = |month: u32, day: u32, close: f64| Bar {
            timestamp: New_York.with_ymd_and_hms(2026, month, day, 0, 0, 0).unwrap().with_timezone(&Utc),
            open: close,
            high: close,
            low: close,
            close,
            volume: 10.0,
        };
        let frame = vec![daily(1, 5, 1.0), daily(2, 10, 2.0), daily(3, 15, 3.0)];
        let out = resample(&frame, Timeframe::Quarter);
        assert_eq!(out.len(), 1);
        let label_local = out[0].timestamp.with_timezone(&New_York);
        assert_eq!((label_local.month(), label_local.day()), (3, 31));
    }

    #[test]
    fn direct_timeframes_are_identity() {
        let frame = vec![hourly_bar(5, 9, 30, 10.0)];
        let out = resample(&frame, Timeframe::Hour1);
        assert_eq!(out, frame);
    }
}
