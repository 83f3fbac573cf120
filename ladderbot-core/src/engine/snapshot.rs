//! Per-cycle market snapshot.
//!
//! Only the 5m series is mandatory. A missing higher timeframe votes
//! sideways, and a missing daily range disables the support/resistance check.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::components::MarketContext;
use crate::data::{intraday_range, last_daily_range, DailyRange, DataError, MarketDataProvider};
use crate::domain::{Candle, Timeframe};

#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    pub candles_5m: Vec<Candle>,
    pub candles_15m: Option<Vec<Candle>>,
    pub candles_1h: Option<Vec<Candle>>,
    pub candles_4h: Option<Vec<Candle>>,
    pub daily_range: Option<DailyRange>,
}

impl MarketSnapshot {
    /// Last 5m close, 0.0 for an empty series.
    pub fn current_price(&self) -> f64 {
        self.candles_5m.last().map_or(0.0, |c| c.close)
    }

    pub fn market_context(&self) -> MarketContext<'_> {
        MarketContext {
            candles_5m: &self.candles_5m,
            candles_1h: self.candles_1h.as_deref(),
            candles_4h: self.candles_4h.as_deref(),
        }
    }
}

fn optional(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    timeframe: Timeframe,
) -> Option<Vec<Candle>> {
    match provider.get_candles(symbol, timeframe) {
        Ok(candles) if !candles.is_empty() => Some(candles),
        Ok(_) => {
            warn!(symbol, timeframe = %timeframe, "no candles, timeframe treated as sideways");
            None
        }
        Err(e) => {
            warn!(symbol, timeframe = %timeframe, error = %e, "candle fetch failed, timeframe treated as sideways");
            None
        }
    }
}

/// Fetch everything one analysis needs.
///
/// Fails only when the 5m series is unavailable or empty.
pub fn gather_snapshot(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    need_4h: bool,
    today: NaiveDate,
) -> Result<MarketSnapshot, DataError> {
    let candles_5m = provider.get_candles(symbol, Timeframe::M5)?;
    if candles_5m.is_empty() {
        return Err(DataError::NoCandles {
            symbol: symbol.to_string(),
            timeframe: Timeframe::M5,
        });
    }

    let candles_15m = optional(provider, symbol, Timeframe::M15);
    let candles_1h = optional(provider, symbol, Timeframe::H1);
    let candles_4h = if need_4h {
        optional(provider, symbol, Timeframe::H4)
    } else {
        None
    };

    let daily_range = candles_1h
        .as_deref()
        .and_then(|c| intraday_range(c, today))
        .or_else(|| {
            debug!(symbol, "no intraday candles for today, falling back to daily candle");
            optional(provider, symbol, Timeframe::D1).and_then(|c| last_daily_range(&c))
        });
    if daily_range.is_none() {
        warn!(symbol, "daily range unknown, support/resistance check will be skipped");
    }

    Ok(MarketSnapshot {
        candles_5m,
        candles_15m,
        candles_1h,
        candles_4h,
        daily_range,
    })
}
