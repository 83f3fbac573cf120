//! Signal aggregation — combines the three timeframe votes and RSI into a
//! single trend, confidence and rationale.
//!
//! Two variants exist; one is chosen at startup by `components::factory`.

pub mod graduated;
pub mod strict;

use super::analysis::{AnalysisResult, RsiInterpretation, TimeframeVotes};
use crate::policy::{AggregatorConfig, RsiConfig};

pub use graduated::GraduatedAggregator;
pub use strict::StrictAggregator;

/// Everything an aggregator reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatorInput {
    pub votes: TimeframeVotes,
    pub rsi: f64,
    pub current_price: f64,
    pub daily_high: Option<f64>,
    pub daily_low: Option<f64>,
}

/// RSI levels used by the aggregators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiBands {
    /// Interpretation: below this is oversold.
    pub oversold: f64,
    /// Interpretation: above this is overbought.
    pub overbought: f64,
    /// Uptrends need RSI strictly below this.
    pub overbought_cap: f64,
    /// Downtrends need RSI strictly above this.
    pub oversold_floor: f64,
}

impl RsiBands {
    pub fn from_config(aggregator: &AggregatorConfig, rsi: &RsiConfig) -> Self {
        Self {
            oversold: rsi.oversold,
            overbought: rsi.overbought,
            overbought_cap: aggregator.overbought_cap,
            oversold_floor: aggregator.oversold_floor,
        }
    }

    pub fn interpret(&self, rsi: f64) -> RsiInterpretation {
        RsiInterpretation::classify(rsi, self.oversold, self.overbought)
    }
}

impl Default for RsiBands {
    fn default() -> Self {
        Self::from_config(&AggregatorConfig::default(), &RsiConfig::default())
    }
}

/// Trait for signal aggregators.
pub trait SignalAggregator: Send + Sync {
    /// Human-readable name (e.g., "strict", "graduated").
    fn name(&self) -> &str;

    /// Produce the unfiltered verdict for this cycle.
    fn aggregate(&self, input: &AggregatorInput) -> AnalysisResult;
}

/// Build the parts of an `AnalysisResult` every aggregator fills the same way.
fn base_result(input: &AggregatorInput, bands: &RsiBands) -> AnalysisResult {
    use super::analysis::Confidence;
    use super::trend::TrendVote;

    AnalysisResult {
        trend: TrendVote::Sideways,
        confidence: Confidence::Low,
        confidence_reason: String::new(),
        rsi: input.rsi,
        rsi_interpretation: bands.interpret(input.rsi),
        votes: input.votes,
        alignment: input.votes.alignment(),
        current_price: input.current_price,
        daily_high: input.daily_high,
        daily_low: input.daily_low,
        consolidation_bypassed: false,
    }
}

#[cfg(test)]
pub(crate) fn input(votes: TimeframeVotes, rsi: f64) -> AggregatorInput {
    AggregatorInput {
        votes,
        rsi,
        current_price: 3000.0,
        daily_high: Some(3050.0),
        daily_low: Some(2950.0),
    }
}
