use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single OHLCV bar at an absolute instant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn is_finite(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }
}

/// Vendor-native fetch granularity. There are exactly two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    Daily,
    Hour1,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Hour1 => "60m",
        }
    }
}

/// Logical presentation granularity. Each has a fixed derivation rule
/// from one of the two base intervals (see the `timeframes` crate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    Hour1,
    Hour2,
    Hour3,
    Hour4,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Timeframe {
    pub const TARGETS: [Timeframe; 9] = [
        Timeframe::Year,
        Timeframe::Quarter,
        Timeframe::Month,
        Timeframe::Week,
        Timeframe::Day,
        Timeframe::Hour4,
        Timeframe::Hour3,
        Timeframe::Hour2,
        Timeframe::Hour1,
    ];

    /// Timeframes whose last-closed classification feeds the bias score.
    pub const BIAS_TIMEFRAMES: [Timeframe; 5] = [
        Timeframe::Year,
        Timeframe::Quarter,
        Timeframe::Month,
        Timeframe::Week,
        Timeframe::Day,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Hour1 => "1H",
            Timeframe::Hour2 => "2H",
            Timeframe::Hour3 => "3H",
            Timeframe::Hour4 => "4H",
            Timeframe::Day => "D",
            Timeframe::Week => "W",
            Timeframe::Month => "M",
            Timeframe::Quarter => "Q",
            Timeframe::Year => "Y",
        }
    }

    /// Base interval this timeframe is fetched or derived from.
    pub fn base_interval(&self) -> Interval {
        match self {
            Timeframe::Hour1 | Timeframe::Hour2 | Timeframe::Hour3 | Timeframe::Hour4 => Interval::Hour1,
            Timeframe::Day | Timeframe::Week | Timeframe::Month | Timeframe::Quarter | Timeframe::Year => {
                Interval::Daily
            }
        }
    }

    /// Whether this timeframe is a direct pass of its base interval (no resampling).
    pub fn is_direct(&self) -> bool {
        matches!(self, Timeframe::Hour1 | Timeframe::Day)
    }

    /// Bias scorer weight; zero for timeframes outside {Y,Q,M,W,D}.
    pub fn bias_weight(&self) -> i32 {
        match self {
            Timeframe::Year => 5,
            Timeframe::Quarter => 4,
            Timeframe::Month => 3,
            Timeframe::Week => 2,
            Timeframe::Day => 1,
            _ => 0,
        }
    }
}

/// The four-state price-action taxonomy, assigned per bar relative to the
/// immediately preceding bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StratClass {
    Inside,
    DirectionalUp,
    DirectionalDown,
    Outside,
}

impl StratClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            StratClass::Inside => "1",
            StratClass::DirectionalUp => "2U",
            StratClass::DirectionalDown => "2D",
            StratClass::Outside => "3",
        }
    }

    /// Bias-scorer sign contribution: +1, -1, or 0.
    pub fn sign(&self) -> i32 {
        match self {
            StratClass::DirectionalUp => 1,
            StratClass::DirectionalDown => -1,
            StratClass::Inside | StratClass::Outside => 0,
        }
    }

    pub fn is_noise_candidate(&self) -> bool {
        matches!(self, StratClass::Inside | StratClass::Outside)
    }
}

/// Trade direction for an emitted setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Bull,
    Bear,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Bull => "bull",
            Direction::Bear => "bear",
        }
    }
}

/// Alignment between a setup's direction and the symbol's bias score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Aligned,
    Counter,
    Neutral,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Aligned => "aligned",
            Alignment::Counter => "counter",
            Alignment::Neutral => "neutral",
        }
    }

    pub fn classify(direction: Direction, bias_score: i32) -> Alignment {
        match (direction, bias_score.signum()) {
            (_, 0) => Alignment::Neutral,
            (Direction::Bull, 1) => Alignment::Aligned,
            (Direction::Bear, -1) => Alignment::Aligned,
            _ => Alignment::Counter,
        }
    }
}

/// A two-bar "NEXT" plan derived from the last closed pair of bars on one timeframe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setup {
    pub tf: Timeframe,
    pub pattern: String,
    pub setup: String,
    pub direction: Direction,
    pub entry: f64,
    pub stop: f64,
    pub prev_timestamp: DateTime<Utc>,
    pub prev_class: StratClass,
    pub prev_high: f64,
    pub prev_low: f64,
    pub last_timestamp: DateTime<Utc>,
    pub last_class: StratClass,
    pub last_high: f64,
    pub last_low: f64,
    pub actionable: bool,
    pub note: String,
}

/// Last-closed classification per timeframe for {Y,Q,M,W,D}, used by the bias scorer.
pub type Context = std::collections::HashMap<Timeframe, StratClass>;
