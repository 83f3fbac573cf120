//! Timeframe trend classifier — short/long SMA crossover per timeframe.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{Candle, Side, Timeframe};
use crate::indicators::simple_moving_average;

/// Direction of one timeframe, or of the overall verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendVote {
    Uptrend,
    Downtrend,
    Sideways,
}

impl TrendVote {
    pub fn is_directional(&self) -> bool {
        !matches!(self, TrendVote::Sideways)
    }

    /// Order side implied by a directional vote.
    pub fn side(&self) -> Option<Side> {
        match self {
            TrendVote::Uptrend => Some(Side::Long),
            TrendVote::Downtrend => Some(Side::Short),
            TrendVote::Sideways => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendVote::Uptrend => "uptrend",
            TrendVote::Downtrend => "downtrend",
            TrendVote::Sideways => "sideways",
        }
    }
}

impl fmt::Display for TrendVote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Short and long SMA lookbacks for one timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendWindows {
    pub short: usize,
    pub long: usize,
}

impl TrendWindows {
    /// Lookbacks sized to roughly one session (short) and several sessions (long).
    pub fn for_timeframe(timeframe: Timeframe) -> Self {
        let (short, long) = match timeframe {
            Timeframe::M5 => (12, 72),
            Timeframe::M15 => (8, 32),
            Timeframe::H1 => (20, 50),
            Timeframe::H4 => (10, 30),
            Timeframe::D1 => (6, 60),
        };
        Self { short, long }
    }
}

/// Classify a candle series for `timeframe`.
///
/// Sideways when the series is shorter than the long window or the two
/// averages are exactly equal.
pub fn classify_trend(candles: &[Candle], timeframe: Timeframe) -> TrendVote {
    let windows = TrendWindows::for_timeframe(timeframe);
    if candles.len() < windows.long {
        return TrendVote::Sideways;
    }

    let (Some(short_ma), Some(long_ma)) = (
        simple_moving_average(candles, windows.short),
        simple_moving_average(candles, windows.long),
    ) else {
        return TrendVote::Sideways;
    };

    if short_ma > long_ma {
        TrendVote::Uptrend
    } else if short_ma < long_ma {
        TrendVote::Downtrend
    } else {
        TrendVote::Sideways
    }
}
