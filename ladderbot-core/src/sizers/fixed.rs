//! Fixed sizer — multiplier is always 1.0.

use super::{Sizer, SizingBreakdown};
use crate::components::filter::PipelineOutcome;

#[derive(Debug, Clone, Default)]
pub struct FixedSizer;

impl Sizer for FixedSizer {
    fn name(&self) -> &str {
        "fixed"
    }

    fn size(&self, _outcome: &PipelineOutcome) -> SizingBreakdown {
        SizingBreakdown::flat(1.0)
    }
}
