//! Strategy composition — aggregator + filter pipeline + sizer + emergency
//! override, built once from a `PolicyConfig`.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::aggregator::{AggregatorInput, SignalAggregator};
use super::analysis::{AnalysisResult, Confidence, TimeframeVotes};
use super::factory::{create_aggregator, create_emergency, create_pipeline, create_sizer};
use super::filter::{higher_timeframe, FilterPipeline, PipelineOutcome};
use super::trend::{classify_trend, TrendVote};
use crate::domain::{closes, Candle, Instrument, PolicyHash, RoundingPolicy, Timeframe, TradeIntent};
use crate::engine::MarketSnapshot;
use crate::indicators::rsi;
use crate::policy::{EntryConfig, PolicyConfig};
use crate::sizers::{EmergencyBlock, EmergencyOverride, Sizer, SizingBreakdown};

/// Aggregator verdict before and after the filter pipeline.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub raw: AnalysisResult,
    pub outcome: PipelineOutcome,
}

impl Analysis {
    pub fn result(&self) -> &AnalysisResult {
        &self.outcome.analysis
    }
}

/// Why no entry was opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbstainReason {
    /// Final verdict is sideways.
    NoTrend { reason: String },
    /// Directional, but below the entry confidence floor.
    LowConfidence { confidence: Confidence, required: Confidence },
    /// The emergency RSI override refused the side.
    EmergencyBlock(EmergencyBlock),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryDecision {
    Enter {
        intent: TradeIntent,
        sizing: SizingBreakdown,
    },
    Abstain(AbstainReason),
}

pub struct Strategy {
    aggregator: Box<dyn SignalAggregator>,
    pipeline: FilterPipeline,
    sizer: Box<dyn Sizer>,
    emergency: EmergencyOverride,
    rsi_period: usize,
    entry: EntryConfig,
    instrument: Instrument,
    policy_hash: PolicyHash,
}

impl Strategy {
    pub fn from_policy(policy: &PolicyConfig, instrument: Instrument) -> Self {
        Self {
            aggregator: create_aggregator(policy),
            pipeline: create_pipeline(policy),
            sizer: create_sizer(policy),
            emergency: create_emergency(policy),
            rsi_period: policy.rsi.period,
            entry: policy.entry.clone(),
            instrument,
            policy_hash: policy.fingerprint(),
        }
    }

    pub fn policy_hash(&self) -> &PolicyHash {
        &self.policy_hash
    }

    pub fn aggregator_name(&self) -> &str {
        self.aggregator.name()
    }

    pub fn sizer_name(&self) -> &str {
        self.sizer.name()
    }

    /// Whether the pipeline can use 4h candles (saves a fetch when it can't).
    pub fn wants_higher_timeframe(&self) -> bool {
        self.pipeline.is_enabled(higher_timeframe::NAME)
    }

    pub fn filter_names(&self) -> Vec<&str> {
        self.pipeline.names()
    }

    /// Votes, RSI, aggregation and filters for one snapshot.
    pub fn analyze(&self, snapshot: &MarketSnapshot) -> Analysis {
        let vote = |candles: Option<&[Candle]>, tf: Timeframe| {
            candles.map_or(TrendVote::Sideways, |c| classify_trend(c, tf))
        };
        let votes = TimeframeVotes::new(
            classify_trend(&snapshot.candles_5m, Timeframe::M5),
            vote(snapshot.candles_15m.as_deref(), Timeframe::M15),
            vote(snapshot.candles_1h.as_deref(), Timeframe::H1),
        );

        let input = AggregatorInput {
            votes,
            rsi: rsi(&closes(&snapshot.candles_5m), self.rsi_period),
            current_price: snapshot.current_price(),
            daily_high: snapshot.daily_range.map(|r| r.high),
            daily_low: snapshot.daily_range.map(|r| r.low),
        };

        let raw = self.aggregator.aggregate(&input);
        let outcome = self.pipeline.run(raw.clone(), &snapshot.market_context());
        Analysis { raw, outcome }
    }

    /// Entry gate, sizing and emergency override, in that order.
    pub fn decide_entry(&self, outcome: &PipelineOutcome) -> EntryDecision {
        let analysis = &outcome.analysis;
        let Some(side) = analysis.side() else {
            return EntryDecision::Abstain(AbstainReason::NoTrend {
                reason: analysis.confidence_reason.clone(),
            });
        };
        if analysis.confidence < self.entry.min_confidence {
            return EntryDecision::Abstain(AbstainReason::LowConfidence {
                confidence: analysis.confidence,
                required: self.entry.min_confidence,
            });
        }

        let sizing = self.sizer.size(outcome);
        info!(
            sizer = self.sizer.name(),
            base = sizing.base,
            rsi_bonus = sizing.rsi_bonus,
            filter_bonus = sizing.filter_bonus,
            htf_bonus = sizing.htf_bonus,
            tier_scalar = sizing.tier_scalar,
            raw = sizing.raw,
            multiplier = sizing.multiplier,
            "lot multiplier"
        );

        if let Some(block) = self.emergency.check(side, analysis.rsi) {
            info!(side = %side, rsi = block.rsi, limit = block.limit, "emergency RSI override blocked entry");
            return EntryDecision::Abstain(AbstainReason::EmergencyBlock(block));
        }

        // A sized lot never rounds up past the multiplier it was given.
        let lot = self
            .instrument
            .round_volume(self.entry.base_lot * sizing.multiplier, RoundingPolicy::Down);
        let take_profit = if analysis.consolidation_bypassed {
            self.entry.bypassed_take_profit_pips
        } else {
            self.entry.take_profit_pips
        };
        EntryDecision::Enter {
            intent: TradeIntent::relative(side, lot, take_profit),
            sizing,
        }
    }
}
