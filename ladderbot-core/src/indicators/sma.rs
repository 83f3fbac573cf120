//! Simple Moving Average over candle closes.

use crate::domain::Candle;

/// Mean of the last `n` closes. `None` when `n == 0` or fewer than `n` candles.
pub fn simple_moving_average(candles: &[Candle], n: usize) -> Option<f64> {
    if n == 0 || candles.len() < n {
        return None;
    }
    let sum: f64 = candles[candles.len() - n..].iter().map(|c| c.close).sum();
    Some(sum / n as f64)
}
