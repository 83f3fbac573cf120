//! Volatility filter — a directional verdict must be backed by price
//! standing far enough from its moving average, measured in ATRs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::{AnalysisFilter, FilterOutcome, FilterVerdict, MarketContext};
use crate::components::analysis::{AnalysisResult, Confidence};
use crate::components::trend::TrendVote;
use crate::indicators::{atr, simple_moving_average};

pub const NAME: &str = "volatility_filter";

/// Which moving average the price is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MaSelection {
    /// Long MA for high confidence, short MA otherwise.
    #[default]
    ByConfidence,
    /// Always the short MA.
    ShortOnly,
}

#[derive(Debug, Clone)]
pub struct VolatilityFilter {
    pub atr_period: usize,
    pub short_ma: usize,
    pub long_ma: usize,
    pub min_candles: usize,
    pub ma_selection: MaSelection,
    /// ATR multiple required for the current aggressiveness tier.
    pub tier_multiplier: f64,
    /// ATR multiple required when confidence is high.
    pub high_confidence_multiplier: f64,
}

impl VolatilityFilter {
    pub fn default_params() -> Self {
        Self {
            atr_period: 14,
            short_ma: 6,
            long_ma: 20,
            min_candles: 20,
            ma_selection: MaSelection::ByConfidence,
            tier_multiplier: 0.5,
            high_confidence_multiplier: 0.1,
        }
    }
}

impl AnalysisFilter for VolatilityFilter {
    fn name(&self) -> &str {
        NAME
    }

    fn evaluate(&self, analysis: AnalysisResult, market: &MarketContext<'_>) -> FilterOutcome {
        if !analysis.is_directional() {
            return FilterOutcome::skipped(analysis);
        }
        let candles = market.candles_5m;
        if candles.len() < self.min_candles {
            return FilterOutcome::skipped(analysis);
        }
        let Some(atr_value) = atr(candles, self.atr_period) else {
            return FilterOutcome::skipped(analysis);
        };
        let (Some(short_ma), Some(long_ma)) = (
            simple_moving_average(candles, self.short_ma),
            simple_moving_average(candles, self.long_ma),
        ) else {
            return FilterOutcome::skipped(analysis);
        };

        let high = analysis.confidence == Confidence::High;
        let ma = match self.ma_selection {
            MaSelection::ByConfidence if high => long_ma,
            _ => short_ma,
        };
        let multiplier = if high {
            self.high_confidence_multiplier
        } else {
            self.tier_multiplier
        };
        let required = atr_value * multiplier;
        let price = analysis.current_price;
        let actual = match analysis.trend {
            TrendVote::Uptrend => price - ma,
            TrendVote::Downtrend => ma - price,
            TrendVote::Sideways => return FilterOutcome::skipped(analysis),
        };

        let mut state = BTreeMap::new();
        state.insert("atr".into(), atr_value);
        state.insert("ma".into(), ma);
        state.insert("multiplier".into(), multiplier);
        state.insert("required_distance".into(), required);
        state.insert("actual_distance".into(), actual);

        let passed = actual >= required;
        debug!(
            atr = atr_value,
            multiplier,
            required,
            price,
            ma,
            actual,
            passed,
            "volatility filter details"
        );

        if passed {
            FilterOutcome {
                analysis,
                verdict: FilterVerdict::Passed,
                filter_state: state,
            }
        } else {
            FilterOutcome {
                analysis: analysis.vetoed("Volatility too high for clear trend"),
                verdict: FilterVerdict::Vetoed,
                filter_state: state,
            }
        }
    }
}
