//! Cycle runner — one decision cycle end to end, and the polling loop.
//!
//! Per cycle:
//! 1. Read the open positions. A failed read skips the cycle.
//! 2. Open positions: the ladder decides. A new rung is placed, positions are
//!    re-read and the shared take-profit is broadcast to every rung.
//!    A holding ladder of two or more rungs repairs drifted take-profits; a
//!    lone first rung keeps its entry take-profit.
//! 3. No positions: gather market data, analyze, and enter if the strategy
//!    says so.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tracing::{error, info, warn};

use ladderbot_core::components::{AbstainReason, EntryDecision};
use ladderbot_core::data::{DataError, MarketDataProvider, PositionStore};
use ladderbot_core::domain::{OrderId, Side};
use ladderbot_core::engine::{gather_snapshot, CycleDecision, DecisionEngine};
use ladderbot_core::position_management::LadderDecision;

use crate::execution::OrderExecutor;
use crate::report::AnalysisReport;
use crate::stats::CycleStats;

/// Errors that end a cycle early.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("position read failed: {0}")]
    Positions(#[source] DataError),
    #[error("market data unavailable: {0}")]
    MarketData(#[source] DataError),
    #[error("cycle panicked: {0}")]
    Panicked(String),
}

/// What a completed cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleReport {
    RungAdded {
        rung: usize,
        order_id: Option<OrderId>,
        take_profits_set: usize,
    },
    RungFailed {
        rung: usize,
        error: String,
    },
    LadderHeld {
        rungs: usize,
        repairs_applied: usize,
    },
    Entered {
        side: Side,
        lot_size: f64,
        order_id: Option<OrderId>,
    },
    EntryFailed {
        side: Side,
        error: String,
    },
    Abstained(AbstainReason),
}

/// Stats after the cycle and how it ended.
#[derive(Debug)]
pub struct CycleOutcome {
    pub stats: CycleStats,
    pub result: Result<CycleReport, CycleError>,
}

pub struct CycleRunner {
    engine: DecisionEngine,
    market: Arc<dyn MarketDataProvider>,
    positions: Arc<dyn PositionStore>,
    executor: OrderExecutor,
    symbol: String,
    poll_interval: Duration,
}

impl CycleRunner {
    pub fn new(
        engine: DecisionEngine,
        market: Arc<dyn MarketDataProvider>,
        positions: Arc<dyn PositionStore>,
        executor: OrderExecutor,
        symbol: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            engine,
            market,
            positions,
            executor,
            symbol: symbol.into(),
            poll_interval,
        }
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// One cycle with today's UTC date.
    pub fn run_cycle(&self, stats: CycleStats) -> CycleOutcome {
        self.run_cycle_on(stats, Utc::now().date_naive())
    }

    /// One cycle with an injected "today" for the daily range.
    pub fn run_cycle_on(&self, mut stats: CycleStats, today: NaiveDate) -> CycleOutcome {
        let result = self.counted_cycle(&mut stats, today);
        CycleOutcome { stats, result }
    }

    fn counted_cycle(&self, stats: &mut CycleStats, today: NaiveDate) -> Result<CycleReport, CycleError> {
        stats.cycles += 1;
        info!(cycle = stats.cycles, symbol = %self.symbol, "cycle start");
        let result = self.cycle(stats, today);
        if let Err(e) = &result {
            stats.data_failures += 1;
            warn!(cycle = stats.cycles, error = %e, "cycle skipped");
        }
        result
    }

    fn cycle(&self, stats: &mut CycleStats, today: NaiveDate) -> Result<CycleReport, CycleError> {
        let positions = self
            .positions
            .get_positions(&self.symbol)
            .map_err(CycleError::Positions)?;

        let decision = self
            .engine
            .decide(&positions, |need_4h| {
                gather_snapshot(self.market.as_ref(), &self.symbol, need_4h, today)
            })
            .map_err(CycleError::MarketData)?;

        Ok(match decision {
            CycleDecision::Ladder(ladder) => self.apply_ladder(ladder, stats),
            CycleDecision::Entry { analysis, decision } => {
                AnalysisReport::new(self.engine.policy_hash(), &self.symbol, &analysis, &decision).log();
                self.apply_entry(decision, stats)
            }
        })
    }

    fn apply_ladder(&self, decision: LadderDecision, stats: &mut CycleStats) -> CycleReport {
        match decision {
            LadderDecision::AddRung(plan) => match self.executor.place(&plan.intent) {
                Ok(confirmation) => {
                    stats.rungs_added += 1;
                    let take_profits_set = self.broadcast_take_profit(stats);
                    CycleReport::RungAdded {
                        rung: plan.rung,
                        order_id: confirmation.order_id,
                        take_profits_set,
                    }
                }
                Err(e) => {
                    stats.order_failures += 1;
                    CycleReport::RungFailed {
                        rung: plan.rung,
                        error: e.to_string(),
                    }
                }
            },
            LadderDecision::Hold(hold) => {
                let summary = self.executor.apply_take_profits(&hold.repairs);
                stats.take_profit_repairs += summary.applied as u64;
                stats.order_failures += summary.failed as u64;
                CycleReport::LadderHeld {
                    rungs: hold.rungs,
                    repairs_applied: summary.applied,
                }
            }
            // Unreachable with open positions; nothing to do either way.
            LadderDecision::Empty => CycleReport::LadderHeld {
                rungs: 0,
                repairs_applied: 0,
            },
        }
    }

    /// Re-read the ladder after a fill and point every rung at the new mean.
    fn broadcast_take_profit(&self, stats: &mut CycleStats) -> usize {
        let positions = match self.positions.get_positions(&self.symbol) {
            Ok(p) => p,
            Err(e) => {
                stats.data_failures += 1;
                warn!(error = %e, "position re-read failed, take-profits repaired next cycle");
                return 0;
            }
        };
        let targets = self.engine.ladder().broadcast_targets(&positions);
        let summary = self.executor.apply_take_profits(&targets);
        stats.order_failures += summary.failed as u64;
        info!(
            rungs = positions.len(),
            applied = summary.applied,
            failed = summary.failed,
            "shared take-profit broadcast"
        );
        summary.applied
    }

    fn apply_entry(&self, decision: EntryDecision, stats: &mut CycleStats) -> CycleReport {
        match decision {
            EntryDecision::Enter { intent, .. } => match self.executor.place(&intent) {
                Ok(confirmation) => {
                    stats.entries_opened += 1;
                    CycleReport::Entered {
                        side: intent.side,
                        lot_size: intent.lot_size,
                        order_id: confirmation.order_id,
                    }
                }
                Err(e) => {
                    stats.order_failures += 1;
                    CycleReport::EntryFailed {
                        side: intent.side,
                        error: e.to_string(),
                    }
                }
            },
            EntryDecision::Abstain(reason) => {
                stats.trades_avoided += 1;
                if matches!(reason, AbstainReason::EmergencyBlock(_)) {
                    stats.emergency_blocks += 1;
                }
                CycleReport::Abstained(reason)
            }
        }
    }

    /// A cycle that never unwinds: errors and panics are logged and absorbed.
    pub fn supervised_cycle(&self, stats: CycleStats) -> CycleOutcome {
        self.supervised_cycle_on(stats, Utc::now().date_naive())
    }

    /// Counters bumped before a panic are kept.
    pub fn supervised_cycle_on(&self, mut stats: CycleStats, today: NaiveDate) -> CycleOutcome {
        let caught = catch_unwind(AssertUnwindSafe(|| self.counted_cycle(&mut stats, today)));
        let result = match caught {
            Ok(result) => result,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(cycle = stats.cycles, error = %message, "cycle panicked, continuing");
                Err(CycleError::Panicked(message))
            }
        };
        CycleOutcome { stats, result }
    }

    /// Run `limit` supervised cycles (forever when `None`), sleeping between them.
    pub fn run_loop(&self, mut stats: CycleStats, limit: Option<u64>) -> CycleStats {
        info!(
            symbol = %self.symbol,
            interval_secs = self.poll_interval.as_secs(),
            gateway = self.executor.gateway_name(),
            policy = self.engine.policy_hash().short(),
            "decision loop started"
        );
        let mut done = 0u64;
        loop {
            let next = self.supervised_cycle(stats).stats;
            debug_assert!(next.dominates(&stats), "cycle counters went backwards");
            stats = next;
            stats.log_summary();
            done += 1;
            if limit.is_some_and(|n| done >= n) {
                return stats;
            }
            std::thread::sleep(self.poll_interval);
        }
    }

    pub fn run_forever(&self) -> CycleStats {
        self.run_loop(CycleStats::default(), None)
    }
}
