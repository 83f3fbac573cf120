//! Strict aggregator — trades only when all three timeframes agree.

use super::{base_result, AggregatorInput, RsiBands, SignalAggregator};
use crate::components::analysis::{AnalysisResult, Confidence};
use crate::components::trend::TrendVote;

/// Unanimous votes with RSI inside the caps give a high-confidence trend;
/// everything else is sideways/low with a reason naming what failed.
#[derive(Debug, Clone)]
pub struct StrictAggregator {
    bands: RsiBands,
}

impl StrictAggregator {
    pub fn new(bands: RsiBands) -> Self {
        Self { bands }
    }
}

impl SignalAggregator for StrictAggregator {
    fn name(&self) -> &str {
        "strict"
    }

    fn aggregate(&self, input: &AggregatorInput) -> AnalysisResult {
        let mut result = base_result(input, &self.bands);
        let up = input.votes.count(TrendVote::Uptrend);
        let down = input.votes.count(TrendVote::Downtrend);
        let rsi = input.rsi;
        let cap = self.bands.overbought_cap;
        let floor = self.bands.oversold_floor;

        if up == 3 && rsi < cap {
            result.trend = TrendVote::Uptrend;
            result.confidence = Confidence::High;
            result.confidence_reason = "All 3 timeframes agree on uptrend, RSI not overbought".into();
        } else if down == 3 && rsi > floor {
            result.trend = TrendVote::Downtrend;
            result.confidence = Confidence::High;
            result.confidence_reason = "All 3 timeframes agree on downtrend, RSI not oversold".into();
        } else if up + down == 0 {
            result.confidence_reason = "All timeframes show sideways movement".into();
        } else if up >= 2 && rsi >= cap {
            result.confidence_reason = format!("Majority uptrend but RSI {rsi} >= {cap} (overbought)");
        } else if down >= 2 && rsi <= floor {
            result.confidence_reason = format!("Majority downtrend but RSI {rsi} <= {floor} (oversold)");
        } else {
            result.confidence_reason =
                "Conflicting timeframe signals (require all 3 timeframes aligned)".into();
        }
        result
    }
}
