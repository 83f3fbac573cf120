//! Relative Strength Index (RSI).
//!
//! Seed averages are the plain mean of the first `period` price changes;
//! every later change is folded in with Wilder smoothing:
//! avg = (avg * (period - 1) + new) / period.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss), rounded to 2 decimals.
//! Edge cases: fewer than period+1 closes → 50; avg_loss == 0 → 50.

/// Neutral RSI returned whenever there is not enough information.
pub const NEUTRAL_RSI: f64 = 50.0;

/// Wilder RSI of the full close series, as of the last close.
pub fn rsi(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period + 1 {
        return NEUTRAL_RSI;
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let (seed, rest) = changes.split_at(period);
    let mut avg_gain = seed.iter().map(|&c| c.max(0.0)).sum::<f64>() / period as f64;
    let mut avg_loss = seed.iter().map(|&c| (-c).max(0.0)).sum::<f64>() / period as f64;

    let p = period as f64;
    for &change in rest {
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        avg_gain = (avg_gain * (p - 1.0) + gain) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss) / p;
    }

    if avg_loss == 0.0 || !avg_loss.is_finite() || !avg_gain.is_finite() {
        return NEUTRAL_RSI;
    }

    let value = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
    round2(value)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
