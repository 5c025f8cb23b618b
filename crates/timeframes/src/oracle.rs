use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use chrono_tz::America::New_York;
use strat_core::{Bar, Timeframe};

/// Decide which index is the last closed bar for this timeframe. Returns
/// `-1` (last row closed) or `-2` (last row in progress, use the previous
/// one). Callers must not inspect the open row.
///
/// This is the single most load-bearing rule in the system: 1H is
/// vendor-native and left-labeled (the timestamp marks bar *start*), while
/// 2H/3H/4H are synthesized by the resampler and right-labeled (the
/// timestamp marks bar *end*). That asymmetry must be preserved exactly.
pub fn last_closed_index(tf: Timeframe, frame: &[Bar], now: DateTime<Utc>) -> isize {
    let Some(last) = frame.last() else {
        return -1;
    };
    let label = last.timestamp;

    let open = match tf {
        Timeframe::Year | Timeframe::Quarter | Timeframe::Month | Timeframe::Week => {
            label > now || now < market_close(label)
        }
        Timeframe::Day => {
            label.with_timezone(&New_York).date_naive() == now.with_timezone(&New_York).date_naive() && now < market_close(label)
        }
        Timeframe::Hour1 => now < label + Duration::hours(1),
        Timeframe::Hour2 | Timeframe::Hour3 | Timeframe::Hour4 => now < label,
    };

    if open {
        -2
    } else {
        -1
    }
}

/// The 16:30 America/New_York anchor on the calendar date of `label`.
fn market_close(label: DateTime<Utc>) -> DateTime<Utc> {
    let local_date = label.with_timezone(&New_York).date_naive();
    New_York
        .with_ymd_and_hms(local_date.year(), local_date.month(), local_date.day(), 16, 30, 0)
        .unwrap()
        .with_timezone(&Utc)
}

/// Resolves `last_closed_index` to an actual bar, or `None` if the frame is
/// too short to have both a closed bar and its predecessor.
pub fn last_closed<'a>(tf: Timeframe, frame: &'a [Bar], now: DateTime<Utc>) -> Option<&'a Bar> {
    let idx = last_closed_index(tf, frame, now);
    let len = frame.len() as isize;
    let resolved = len + idx;
    if resolved < 0 {
        None
    } else {
        frame.get(resolved as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar_at(ts: DateTime<Utc>) -> Bar {
        Bar { timestamp: ts, open: 1.0, high: 1.0, low: 1.0, close: 1.0, volume: 1.0 }
    }

    #[test]
    fn hour1_is_left_labeled_closed_after_one_hour() {
        let label = New_York.with_ymd_and_hms(2026, 1, 5, 9, 30, 0).unwrap().with_timezone(&Utc);
        let frame = vec![bar_at(label)];
        let just_before_close = label + Duration::minutes(59);
        let just_after_close = label + Duration::hours(1);
        assert_eq!(last_closed_index(Timeframe::Hour1, &frame, just_before_close), -2);
        assert_eq!(last_closed_index(Timeframe::Hour1, &frame, just_after_close), -1);
    }

    #[test]
    fn hour2_is_right_labeled_closed_at_label() {
        let label = New_York.with_ymd_and_hms(2026, 1, 5, 11, 30, 0).unwrap().with_timezone(&Utc);
        let frame = vec![bar_at(label)];
        assert_eq!(last_closed_index(Timeframe::Hour2, &frame, label - Duration::minutes(1)), -2);
        assert_eq!(last_closed_index(Timeframe::Hour2, &frame, label), -1);
    }

    #[test]
    fn weekly_boundary_wednesday_vs_following_saturday() {
        // Last row labeled next Friday at 00:00 ET.
        let friday = New_York.with_ymd_and_hms(2026, 1, 9, 0, 0, 0).unwrap().with_timezone(&Utc);
        let frame = vec![bar_at(friday)];
        let wednesday = New_York.with_ymd_and_hms(2026, 1, 7, 12, 0, 0).unwrap().with_timezone(&Utc);
        let saturday = New_York.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap().with_timezone(&Utc);
        assert_eq!(last_closed_index(Timeframe::Week, &frame, wednesday), -2);
        assert_eq!(last_closed_index(Timeframe::Week, &frame, saturday), -1);
    }

    #[test]
    fn daily_closes_at_1630_et_same_day() {
        let label = New_York.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap().with_timezone(&Utc);
        let frame = vec![bar_at(label)];
        let before_close = New_York.with_ymd_and_hms(2026, 1, 5, 15, 0, 0).unwrap().with_timezone(&Utc);
        let after_close = New_York.with_ymd_and_hms(2026, 1, 5, 17, 0, 0).unwrap().with_timezone(&Utc);
        assert_eq!(last_closed_index(Timeframe::Day, &frame, before_close), -2);
        assert_eq!(last_closed_index(Timeframe::Day, &frame, after_close), -1);
    }

    #[test]
    fn last_closed_resolves_to_previous_bar_when_open() {
        let t1 = New_York.with_ymd_and_hms(2026, 1, 4, 0, 0, 0).unwrap().with_timezone(&Utc);
        let t2 = New_York.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap().with_timezone(&Utc);
        let frame = vec![bar_at(t1), bar_at(t2)];
        let before_close = New_York.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap().with_timezone(&Utc);
        let resolved = last_closed(Timeframe::Day, &frame, before_close).unwrap();
        assert_eq!(resolved.timestamp, t1);
    }
}
