//! Bollinger band width ratio.
//!
//! Middle = SMA(close, period); σ = population stddev of the same closes.
//! Width = upper - lower = 2·k·σ; ratio = width / middle.
//! A narrow ratio means the market is consolidating.

use crate::domain::Candle;

/// Band width divided by the middle band over the last `period` closes.
///
/// `None` below `period` candles or when the mean is zero.
pub fn bollinger_width_ratio(candles: &[Candle], period: usize, k: f64) -> Option<f64> {
    if period == 0 || candles.len() < period {
        return None;
    }

    let window = &candles[candles.len() - period..];
    let n = period as f64;
    let mean = window.iter().map(|c| c.close).sum::<f64>() / n;
    if mean == 0.0 || !mean.is_finite() {
        return None;
    }

    let variance = window.iter().map(|c| (c.close - mean).powi(2)).sum::<f64>() / n;
    let sigma = variance.sqrt();
    let upper = mean + k * sigma;
    let lower = mean - k * sigma;
    Some((upper - lower) / mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn flat_series_has_zero_width() {
        let candles = make_candles(&[100.0; 10]);
        assert_approx(bollinger_width_ratio(&candles, 10, 2.0).unwrap(), 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn known_width() {
        // closes 98, 102 → mean 100, σ = 2 → width = 2·2·2 = 8 → ratio 0.08
        let candles = make_candles(&[98.0, 102.0]);
        assert_approx(bollinger_width_ratio(&candles, 2, 2.0).unwrap(), 0.08, DEFAULT_EPSILON);
    }

    #[test]
    fn only_last_period_counts() {
        let candles = make_candles(&[10.0, 500.0, 98.0, 102.0]);
        assert_approx(bollinger_width_ratio(&candles, 2, 2.0).unwrap(), 0.08, DEFAULT_EPSILON);
    }

    #[test]
    fn too_few_candles() {
        let candles = make_candles(&[100.0, 101.0]);
        assert_eq!(bollinger_width_ratio(&candles, 3, 2.0), None);
        assert_eq!(bollinger_width_ratio(&candles, 0, 2.0), None);
    }
}
