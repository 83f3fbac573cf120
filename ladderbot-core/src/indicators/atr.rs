//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR here is the simple mean of the last `period` true ranges, rounded to
//! 4 decimals. Needs period+1 candles so every TR has a previous close.

use crate::domain::Candle;

/// True range of `candle` given the previous close.
pub fn true_range(candle: &Candle, prev_close: f64) -> f64 {
    (candle.high - candle.low)
        .max((candle.high - prev_close).abs())
        .max((candle.low - prev_close).abs())
}

/// ATR over the last `period` true ranges, or `None` below period+1 candles.
pub fn atr(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }

    let window = &candles[candles.len() - (period + 1)..];
    let sum: f64 = window
        .windows(2)
        .map(|pair| true_range(&pair[1], pair[0].close))
        .sum();
    let value = sum / period as f64;
    if !value.is_finite() {
        return None;
    }
    Some((value * 10_000.0).round() / 10_000.0)
}
