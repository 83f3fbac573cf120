//! One decision per cycle: manage the open ladder, or look for an entry.

use tracing::info;

use super::snapshot::MarketSnapshot;
use crate::components::{Analysis, EntryDecision, Strategy};
use crate::data::DataError;
use crate::domain::{Instrument, PolicyHash, Position};
use crate::policy::PolicyConfig;
use crate::position_management::{LadderDecision, LadderManager};

#[derive(Debug, Clone)]
pub enum CycleDecision {
    /// Positions were open; entry analysis never ran.
    Ladder(LadderDecision),
    /// No positions: full analysis and the entry verdict.
    Entry {
        analysis: Box<Analysis>,
        decision: EntryDecision,
    },
}

pub struct DecisionEngine {
    strategy: Strategy,
    ladder: LadderManager,
}

impl DecisionEngine {
    pub fn from_policy(policy: &PolicyConfig, instrument: Instrument) -> Self {
        let engine = Self {
            strategy: Strategy::from_policy(policy, instrument.clone()),
            ladder: LadderManager::new(&policy.ladder, instrument),
        };
        info!(
            policy = engine.strategy.policy_hash().short(),
            aggregator = engine.strategy.aggregator_name(),
            sizer = engine.strategy.sizer_name(),
            filters = ?engine.strategy.filter_names(),
            "decision engine ready"
        );
        engine
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn ladder(&self) -> &LadderManager {
        &self.ladder
    }

    pub fn policy_hash(&self) -> &PolicyHash {
        self.strategy.policy_hash()
    }

    pub fn evaluate_entry(&self, snapshot: &MarketSnapshot) -> (Analysis, EntryDecision) {
        let analysis = self.strategy.analyze(snapshot);
        let decision = self.strategy.decide_entry(&analysis.outcome);
        (analysis, decision)
    }

    /// Positions first: any open rung means the ladder owns the cycle and
    /// `snapshot` is never called.
    pub fn decide<F>(&self, positions: &[Position], snapshot: F) -> Result<CycleDecision, DataError>
    where
        F: FnOnce(bool) -> Result<MarketSnapshot, DataError>,
    {
        if !positions.is_empty() {
            return Ok(CycleDecision::Ladder(self.ladder.evaluate(positions)));
        }
        let snapshot = snapshot(self.strategy.wants_higher_timeframe())?;
        let (analysis, decision) = self.evaluate_entry(&snapshot);
        Ok(CycleDecision::Entry {
            analysis: Box::new(analysis),
            decision,
        })
    }
}
