//! Position management: the martingale ladder.
//!
//! **Key Design Principles:**
//! 1. The manager plans from the broker's snapshot, it never fills or modifies
//! 2. Every rung shares one exit target
//! 3. The next cycle recomputes from scratch, so a half-applied plan self-heals

pub mod ladder;

pub use ladder::{HoldPlan, LadderDecision, LadderManager, RungPlan, TakeProfitRepair};
