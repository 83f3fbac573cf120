//! Cycle statistics — monotone counters threaded through every cycle.

use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStats {
    pub cycles: u64,
    pub entries_opened: u64,
    pub rungs_added: u64,
    /// Entry cycles that ended without an order (no trend, low confidence, emergency).
    pub trades_avoided: u64,
    pub emergency_blocks: u64,
    pub data_failures: u64,
    pub order_failures: u64,
    pub take_profit_repairs: u64,
}

impl CycleStats {
    pub fn log_summary(&self) {
        info!(
            cycles = self.cycles,
            entries_opened = self.entries_opened,
            rungs_added = self.rungs_added,
            trades_avoided = self.trades_avoided,
            emergency_blocks = self.emergency_blocks,
            data_failures = self.data_failures,
            order_failures = self.order_failures,
            take_profit_repairs = self.take_profit_repairs,
            "cycle stats"
        );
    }

    /// True when no counter in `self` is below the one in `earlier`.
    pub fn dominates(&self, earlier: &CycleStats) -> bool {
        self.cycles >= earlier.cycles
            && self.entries_opened >= earlier.entries_opened
            && self.rungs_added >= earlier.rungs_added
            && self.trades_avoided >= earlier.trades_avoided
            && self.emergency_blocks >= earlier.emergency_blocks
            && self.data_failures >= earlier.data_failures
            && self.order_failures >= earlier.order_failures
            && self.take_profit_repairs >= earlier.take_profit_repairs
    }
}
