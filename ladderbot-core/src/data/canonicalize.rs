//! Candle canonicalization: sort, dedupe, validate.
//!
//! Everything downstream assumes candles are strictly increasing in
//! `open_time`, so the REST adapter runs every fetched series through here.

use crate::domain::Candle;

/// Canonicalized series plus what was thrown away.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalCandles {
    pub candles: Vec<Candle>,
    pub dropped_duplicates: usize,
    pub dropped_invalid: usize,
}

/// Sort by `open_time`, keep the last copy of a repeated bucket (the broker
/// may return the forming candle twice), and drop candles failing the OHLC
/// sanity check.
pub fn canonicalize_candles(mut raw: Vec<Candle>) -> CanonicalCandles {
    let before = raw.len();
    raw.retain(Candle::is_sane);
    let dropped_invalid = before - raw.len();

    // Stable sort keeps arrival order within a bucket, so "last" is the latest copy.
    raw.sort_by_key(|c| c.open_time);

    let mut candles: Vec<Candle> = Vec::with_capacity(raw.len());
    let mut dropped_duplicates = 0;
    for candle in raw {
        match candles.last_mut() {
            Some(prev) if prev.open_time == candle.open_time => {
                *prev = candle;
                dropped_duplicates += 1;
            }
            _ => candles.push(candle),
        }
    }

    CanonicalCandles {
        candles,
        dropped_duplicates,
        dropped_invalid,
    }
}
