//! Support/resistance filter — no selling into the daily low with an
//! oversold RSI, no buying into the daily high with an overbought RSI.

use std::collections::BTreeMap;

use super::{AnalysisFilter, FilterOutcome, FilterVerdict, MarketContext};
use crate::components::analysis::AnalysisResult;
use crate::components::trend::TrendVote;

pub const NAME: &str = "support_resistance_filter";

#[derive(Debug, Clone)]
pub struct SupportResistanceFilter {
    /// Relative distance that counts as "near" (0.01 = 1%).
    pub proximity: f64,
    pub oversold: f64,
    pub overbought: f64,
}

impl SupportResistanceFilter {
    pub fn new(proximity: f64, oversold: f64, overbought: f64) -> Self {
        Self {
            proximity,
            oversold,
            overbought,
        }
    }
}

impl AnalysisFilter for SupportResistanceFilter {
    fn name(&self) -> &str {
        NAME
    }

    fn evaluate(&self, analysis: AnalysisResult, _market: &MarketContext<'_>) -> FilterOutcome {
        if !analysis.is_directional() {
            return FilterOutcome::skipped(analysis);
        }
        let (Some(high), Some(low)) = (analysis.daily_high, analysis.daily_low) else {
            return FilterOutcome::skipped(analysis);
        };
        if high <= 0.0 || low <= 0.0 {
            return FilterOutcome::skipped(analysis);
        }

        let price = analysis.current_price;
        let rsi = analysis.rsi;
        let to_low = (price - low).abs() / low;
        let to_high = (high - price).abs() / high;

        let mut state = BTreeMap::new();
        state.insert("distance_to_low".into(), to_low);
        state.insert("distance_to_high".into(), to_high);
        state.insert("proximity".into(), self.proximity);

        if analysis.trend == TrendVote::Downtrend && to_low <= self.proximity && rsi < self.oversold {
            let reason = format!(
                "Near daily support (low={low}) with oversold RSI ({rsi}) - avoiding sell trades"
            );
            return FilterOutcome {
                analysis: analysis.vetoed(reason),
                verdict: FilterVerdict::Vetoed,
                filter_state: state,
            };
        }

        if analysis.trend == TrendVote::Uptrend && to_high <= self.proximity && rsi > self.overbought {
            let reason = format!(
                "Near daily resistance (high={high}) with overbought RSI ({rsi}) - avoiding buy trades"
            );
            return FilterOutcome {
                analysis: analysis.vetoed(reason),
                verdict: FilterVerdict::Vetoed,
                filter_state: state,
            };
        }

        FilterOutcome {
            analysis,
            verdict: FilterVerdict::Passed,
            filter_state: state,
        }
    }
}
