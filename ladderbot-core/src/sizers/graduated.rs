//! Graduated sizer — base multiplier plus bonuses for neutral RSI, active
//! filters and 4h confirmation, scaled by the aggressiveness tier.

use super::{Sizer, SizingBreakdown};
use crate::components::analysis::Confidence;
use crate::components::filter::PipelineOutcome;

#[derive(Debug, Clone)]
pub struct GraduatedSizer {
    pub base: f64,
    pub rsi_bonus: f64,
    pub rsi_neutral_low: f64,
    pub rsi_neutral_high: f64,
    /// Bonus per enabled filter, only for high-confidence verdicts.
    pub filter_bonus: f64,
    pub enabled_filters: usize,
    pub htf_bonus: f64,
    pub tier_scalar: f64,
    pub min_multiplier: f64,
    pub max_multiplier: f64,
}

impl GraduatedSizer {
    pub fn default_params(enabled_filters: usize) -> Self {
        Self {
            base: 2.0,
            rsi_bonus: 0.5,
            rsi_neutral_low: 40.0,
            rsi_neutral_high: 60.0,
            filter_bonus: 0.15,
            enabled_filters,
            htf_bonus: 0.2,
            tier_scalar: 1.0,
            min_multiplier: 0.5,
            max_multiplier: 3.0,
        }
    }
}

impl Sizer for GraduatedSizer {
    fn name(&self) -> &str {
        "graduated"
    }

    fn size(&self, outcome: &PipelineOutcome) -> SizingBreakdown {
        let analysis = &outcome.analysis;

        let rsi_bonus = if (self.rsi_neutral_low..=self.rsi_neutral_high).contains(&analysis.rsi) {
            self.rsi_bonus
        } else {
            0.0
        };
        let filter_bonus = if analysis.confidence == Confidence::High {
            self.filter_bonus * self.enabled_filters as f64
        } else {
            0.0
        };
        let htf_bonus = if outcome.higher_timeframe_confirmed() {
            self.htf_bonus
        } else {
            0.0
        };

        let raw = (self.base + rsi_bonus + filter_bonus + htf_bonus) * self.tier_scalar;
        SizingBreakdown {
            base: self.base,
            rsi_bonus,
            filter_bonus,
            htf_bonus,
            tier_scalar: self.tier_scalar,
            raw,
            multiplier: raw.clamp(self.min_multiplier, self.max_multiplier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::filter::test_support::analysis;
    use crate::components::filter::{higher_timeframe, FilterEvaluation, FilterVerdict};
    use crate::components::trend::TrendVote;
    use std::collections::BTreeMap;

    fn outcome(confidence: Confidence, rsi: f64, htf_confirmed: bool) -> PipelineOutcome {
        let mut analysis = analysis(TrendVote::Uptrend, confidence);
        analysis.rsi = rsi;
        let evaluations = if htf_confirmed {
            vec![FilterEvaluation {
                filter_name: higher_timeframe::NAME.into(),
                verdict: FilterVerdict::Confirmed,
                before: (TrendVote::Uptrend, Confidence::Medium),
                after: (TrendVote::Uptrend, Confidence::High),
                filter_state: BTreeMap::new(),
            }]
        } else {
            Vec::new()
        };
        PipelineOutcome { analysis, evaluations }
    }

    #[test]
    fn all_bonuses_add_up() {
        let sizer = GraduatedSizer::default_params(3);
        let b = sizer.size(&outcome(Confidence::High, 50.0, false));
        assert_eq!(b.rsi_bonus, 0.5);
        assert!((b.filter_bonus - 0.45).abs() < 1e-12);
        assert_eq!(b.htf_bonus, 0.0);
        assert!((b.multiplier - 2.95).abs() < 1e-12);
    }

    #[test]
    fn htf_bonus_applies_when_confirmed() {
        let sizer = GraduatedSizer::default_params(0);
        let b = sizer.size(&outcome(Confidence::Medium, 70.0, true));
        assert_eq!(b.rsi_bonus, 0.0);
        assert_eq!(b.filter_bonus, 0.0);
        assert!((b.multiplier - 2.2).abs() < 1e-12);
    }

    #[test]
    fn clamped_to_max() {
        let mut sizer = GraduatedSizer::default_params(4);
        sizer.tier_scalar = 1.2;
        let b = sizer.size(&outcome(Confidence::High, 50.0, true));
        assert!(b.raw > 3.0);
        assert_eq!(b.multiplier, 3.0);
    }

    #[test]
    fn clamped_to_min() {
        let mut sizer = GraduatedSizer::default_params(0);
        sizer.base = 0.1;
        let b = sizer.size(&outcome(Confidence::Low, 10.0, false));
        assert_eq!(b.multiplier, 0.5);
    }

    #[test]
    fn neutral_band_is_inclusive() {
        let sizer = GraduatedSizer::default_params(0);
        assert_eq!(sizer.size(&outcome(Confidence::Medium, 40.0, false)).rsi_bonus, 0.5);
        assert_eq!(sizer.size(&outcome(Confidence::Medium, 60.0, false)).rsi_bonus, 0.5);
        assert_eq!(sizer.size(&outcome(Confidence::Medium, 60.01, false)).rsi_bonus, 0.0);
    }
}
