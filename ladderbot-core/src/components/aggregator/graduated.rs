//! Graduated aggregator — a two-of-three majority earns medium confidence.

use super::{base_result, AggregatorInput, RsiBands, SignalAggregator};
use crate::components::analysis::{AnalysisResult, Confidence};
use crate::components::trend::TrendVote;

#[derive(Debug, Clone)]
pub struct GraduatedAggregator {
    bands: RsiBands,
}

impl GraduatedAggregator {
    pub fn new(bands: RsiBands) -> Self {
        Self { bands }
    }
}

impl SignalAggregator for GraduatedAggregator {
    fn name(&self) -> &str {
        "graduated"
    }

    fn aggregate(&self, input: &AggregatorInput) -> AnalysisResult {
        let mut result = base_result(input, &self.bands);
        let up = input.votes.count(TrendVote::Uptrend);
        let down = input.votes.count(TrendVote::Downtrend);
        let rsi = input.rsi;
        let cap = self.bands.overbought_cap;
        let floor = self.bands.oversold_floor;

        if up >= 2 {
            if rsi >= cap {
                result.confidence_reason =
                    format!("Majority uptrend but RSI {rsi} >= {cap} (overbought)");
                return result;
            }
            result.trend = TrendVote::Uptrend;
            if up == 3 {
                result.confidence = Confidence::High;
                result.confidence_reason = "All 3 timeframes agree on uptrend, RSI not overbought".into();
            } else {
                result.confidence = Confidence::Medium;
                result.confidence_reason = "2 of 3 timeframes agree on uptrend, RSI not overbought".into();
            }
        } else if down >= 2 {
            if rsi <= floor {
                result.confidence_reason =
                    format!("Majority downtrend but RSI {rsi} <= {floor} (oversold)");
                return result;
            }
            result.trend = TrendVote::Downtrend;
            if down == 3 {
                result.confidence = Confidence::High;
                result.confidence_reason = "All 3 timeframes agree on downtrend, RSI not oversold".into();
            } else {
                result.confidence = Confidence::Medium;
                result.confidence_reason = "2 of 3 timeframes agree on downtrend, RSI not oversold".into();
            }
        } else if up + down == 0 {
            result.confidence_reason = "All timeframes show sideways movement".into();
        } else {
            result.confidence_reason = "Conflicting timeframe signals (no majority)".into();
        }
        result
    }
}
