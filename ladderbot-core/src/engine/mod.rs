//! Decision engine — one pass of the trading cycle, free of I/O except
//! through the collaborator traits.

pub mod decision;
pub mod snapshot;

pub use decision::{CycleDecision, DecisionEngine};
pub use snapshot::{gather_snapshot, MarketSnapshot};
