//! Stateless indicator functions.
//!
//! Every function reads the tail of an oldest → newest series and returns a
//! single value for the latest bar. Insufficient data yields `None` (or the
//! neutral 50 for RSI) instead of an error.

pub mod atr;
pub mod bollinger;
pub mod rsi;
pub mod sma;

pub use atr::{atr, true_range};
pub use bollinger::bollinger_width_ratio;
pub use rsi::{rsi, NEUTRAL_RSI};
pub use sma::simple_moving_average;

/// Create synthetic 5-minute candles from close prices for testing.
///
/// Generates plausible OHLC: open = prev_close (or close for first candle),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<crate::domain::Candle> {
    use crate::domain::Candle;
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2025, 11, 15, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                open_time: base + Duration::minutes(5 * i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
