//! Position sizers — turn a filtered verdict into a lot-size multiplier.
//!
//! Sizers never decide whether to trade; the entry gate and the emergency
//! override do that. They only report how much, with every term visible.

pub mod emergency;
pub mod fixed;
pub mod graduated;

pub use emergency::{EmergencyBlock, EmergencyOverride};
pub use fixed::FixedSizer;
pub use graduated::GraduatedSizer;

use serde::{Deserialize, Serialize};

use crate::components::filter::PipelineOutcome;

/// Every additive term of a sizing decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizingBreakdown {
    pub base: f64,
    pub rsi_bonus: f64,
    pub filter_bonus: f64,
    pub htf_bonus: f64,
    pub tier_scalar: f64,
    /// `(base + bonuses) * tier_scalar` before clamping.
    pub raw: f64,
    /// Final multiplier applied to the base lot.
    pub multiplier: f64,
}

impl SizingBreakdown {
    /// A breakdown with no bonuses and a single fixed multiplier.
    pub fn flat(multiplier: f64) -> Self {
        Self {
            base: multiplier,
            rsi_bonus: 0.0,
            filter_bonus: 0.0,
            htf_bonus: 0.0,
            tier_scalar: 1.0,
            raw: multiplier,
            multiplier,
        }
    }
}

/// Position sizing logic
///
/// # Non-Responsibilities
/// - Sizers do NOT decide entry (that's the entry gate's job)
/// - Sizers do NOT block trades (that's the emergency override's job)
pub trait Sizer: Send + Sync {
    /// Sizer name for logging
    fn name(&self) -> &str;

    fn size(&self, outcome: &PipelineOutcome) -> SizingBreakdown;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_breakdown_has_no_bonuses() {
        let b = SizingBreakdown::flat(1.0);
        assert_eq!(b.multiplier, 1.0);
        assert_eq!(b.raw, 1.0);
        assert_eq!(b.rsi_bonus + b.filter_bonus + b.htf_bonus, 0.0);
    }
}
