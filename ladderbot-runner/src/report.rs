//! Analysis report — what one entry analysis saw and concluded.
//!
//! Logged field by field every cycle and serializable for the CLI's
//! `analyze` command.

use serde::Serialize;
use tracing::info;

use ladderbot_core::components::{
    AbstainReason, Alignment, Analysis, Confidence, EntryDecision, FilterEvaluation,
    RsiInterpretation, TimeframeVotes, TrendVote,
};
use ladderbot_core::domain::{PolicyHash, TradeIntent};
use ladderbot_core::sizers::SizingBreakdown;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DecisionSummary {
    Enter {
        intent: TradeIntent,
        sizing: SizingBreakdown,
    },
    Abstain {
        reason: AbstainReason,
    },
}

impl From<&EntryDecision> for DecisionSummary {
    fn from(decision: &EntryDecision) -> Self {
        match decision {
            EntryDecision::Enter { intent, sizing } => DecisionSummary::Enter {
                intent: intent.clone(),
                sizing: *sizing,
            },
            EntryDecision::Abstain(reason) => DecisionSummary::Abstain {
                reason: reason.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub policy: String,
    pub symbol: String,
    pub trend: TrendVote,
    pub confidence: Confidence,
    pub confidence_reason: String,
    pub raw_trend: TrendVote,
    pub raw_confidence: Confidence,
    pub rsi: f64,
    pub rsi_interpretation: RsiInterpretation,
    pub votes: TimeframeVotes,
    pub alignment: Alignment,
    pub current_price: f64,
    pub daily_high: Option<f64>,
    pub daily_low: Option<f64>,
    pub consolidation_bypassed: bool,
    pub filters: Vec<FilterEvaluation>,
    /// First filter that overwrote the verdict, if any.
    pub vetoed_by: Option<String>,
    pub decision: DecisionSummary,
}

impl AnalysisReport {
    pub fn new(policy: &PolicyHash, symbol: &str, analysis: &Analysis, decision: &EntryDecision) -> Self {
        let result = analysis.result();
        Self {
            policy: policy.short().to_string(),
            symbol: symbol.to_string(),
            trend: result.trend,
            confidence: result.confidence,
            confidence_reason: result.confidence_reason.clone(),
            raw_trend: analysis.raw.trend,
            raw_confidence: analysis.raw.confidence,
            rsi: result.rsi,
            rsi_interpretation: result.rsi_interpretation,
            votes: result.votes,
            alignment: result.alignment,
            current_price: result.current_price,
            daily_high: result.daily_high,
            daily_low: result.daily_low,
            consolidation_bypassed: result.consolidation_bypassed,
            filters: analysis.outcome.evaluations.clone(),
            vetoed_by: analysis.outcome.vetoed_by().map(str::to_string),
            decision: decision.into(),
        }
    }

    pub fn log(&self) {
        info!(
            policy = %self.policy,
            symbol = %self.symbol,
            price = self.current_price,
            rsi = self.rsi,
            rsi_interpretation = %self.rsi_interpretation,
            m5 = %self.votes.m5,
            m15 = %self.votes.m15,
            h1 = %self.votes.h1,
            alignment = %self.alignment,
            daily_high = ?self.daily_high,
            daily_low = ?self.daily_low,
            "market analysis"
        );
        for f in &self.filters {
            info!(
                filter = %f.filter_name,
                verdict = f.verdict.as_str(),
                before = %format_args!("{}/{}", f.before.0, f.before.1),
                after = %format_args!("{}/{}", f.after.0, f.after.1),
                state = ?f.filter_state,
                "filter"
            );
        }
        info!(
            raw = %format_args!("{}/{}", self.raw_trend, self.raw_confidence),
            trend = %self.trend,
            confidence = %self.confidence,
            reason = %self.confidence_reason,
            bypassed = self.consolidation_bypassed,
            vetoed_by = self.vetoed_by.as_deref().unwrap_or("none"),
            "verdict"
        );
        match &self.decision {
            DecisionSummary::Enter { intent, sizing } => info!(
                side = %intent.side,
                lot = intent.lot_size,
                take_profit = intent.take_profit,
                multiplier = sizing.multiplier,
                "decision: enter"
            ),
            DecisionSummary::Abstain { reason } => info!(reason = ?reason, "decision: no trade"),
        }
    }
}
