//! Daily high/low used by the support/resistance filter.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeSource {
    /// Today's (UTC) 1h candles.
    Intraday,
    /// The last daily candle.
    DailyCandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyRange {
    pub high: f64,
    pub low: f64,
    pub source: RangeSource,
}

/// High/low over the 1h candles that opened on `today` (UTC).
pub fn intraday_range(candles_1h: &[Candle], today: NaiveDate) -> Option<DailyRange> {
    let mut todays = candles_1h
        .iter()
        .filter(|c| c.open_time.date_naive() == today)
        .peekable();
    todays.peek()?;

    let (high, low) = todays.fold((f64::NEG_INFINITY, f64::INFINITY), |(h, l), c| {
        (h.max(c.high), l.min(c.low))
    });
    Some(DailyRange {
        high,
        low,
        source: RangeSource::Intraday,
    })
}

/// High/low of the most recent daily candle.
pub fn last_daily_range(candles_1d: &[Candle]) -> Option<DailyRange> {
    candles_1d.last().map(|c| DailyRange {
        high: c.high,
        low: c.low,
        source: RangeSource::DailyCandle,
    })
}
