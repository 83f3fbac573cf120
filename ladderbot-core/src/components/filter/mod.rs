//! Filter pipeline — sequentially transforms the aggregator's verdict.
//!
//! Filters run in a fixed order. Each one receives the current
//! `AnalysisResult` by value and returns a (possibly) modified copy plus a
//! `FilterEvaluation` record capturing the verdict and the filter's state at
//! evaluation time. Filters only ever act on directional verdicts, so running
//! any of them on a sideways result leaves it unchanged.

pub mod consolidation;
pub mod higher_timeframe;
pub mod support_resistance;
pub mod volatility;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::analysis::{AnalysisResult, Confidence};
use super::trend::TrendVote;
use crate::domain::Candle;

pub use consolidation::ConsolidationFilter;
pub use higher_timeframe::HigherTimeframeFilter;
pub use support_resistance::SupportResistanceFilter;
pub use volatility::{MaSelection, VolatilityFilter};

/// Market data the filters may look at beyond the verdict itself.
#[derive(Debug, Clone, Copy)]
pub struct MarketContext<'a> {
    pub candles_5m: &'a [Candle],
    pub candles_1h: Option<&'a [Candle]>,
    pub candles_4h: Option<&'a [Candle]>,
}

/// Outcome of a single filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterVerdict {
    /// Turned off in the policy.
    Disabled,
    /// Not applicable (sideways verdict or missing data).
    Skipped,
    Passed,
    /// Overwrote the verdict with sideways/low.
    Vetoed,
    /// Would have vetoed, waived for a unanimous trend.
    Bypassed,
    /// Agreed with the verdict and may have raised confidence.
    Confirmed,
}

impl FilterVerdict {
    pub fn is_veto(&self) -> bool {
        matches!(self, Self::Vetoed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Skipped => "skipped",
            Self::Passed => "passed",
            Self::Vetoed => "vetoed",
            Self::Bypassed => "bypassed",
            Self::Confirmed => "confirmed",
        }
    }
}

/// What a filter hands back to the pipeline.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub analysis: AnalysisResult,
    pub verdict: FilterVerdict,
    pub filter_state: BTreeMap<String, f64>,
}

impl FilterOutcome {
    pub fn skipped(analysis: AnalysisResult) -> Self {
        Self {
            analysis,
            verdict: FilterVerdict::Skipped,
            filter_state: BTreeMap::new(),
        }
    }
}

/// Record of one filter in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterEvaluation {
    pub filter_name: String,
    pub verdict: FilterVerdict,
    pub before: (TrendVote, Confidence),
    pub after: (TrendVote, Confidence),
    /// Snapshot of the values the filter compared (e.g. width ratio, threshold).
    pub filter_state: BTreeMap<String, f64>,
}

/// Trait for analysis filters.
///
/// # Architecture invariant
/// Filters see market data and the verdict only, never positions.
pub trait AnalysisFilter: Send + Sync {
    /// Human-readable name (e.g., "consolidation_filter").
    fn name(&self) -> &str;

    fn evaluate(&self, analysis: AnalysisResult, market: &MarketContext<'_>) -> FilterOutcome;
}

struct Stage {
    filter: Box<dyn AnalysisFilter>,
    enabled: bool,
}

/// Ordered list of filters, each independently enabled.
#[derive(Default)]
pub struct FilterPipeline {
    stages: Vec<Stage>,
}

/// Final verdict plus the ordered filter report.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub analysis: AnalysisResult,
    pub evaluations: Vec<FilterEvaluation>,
}

impl PipelineOutcome {
    /// True when the higher-timeframe filter agreed with the verdict.
    pub fn higher_timeframe_confirmed(&self) -> bool {
        self.evaluations
            .iter()
            .any(|e| e.filter_name == higher_timeframe::NAME && e.verdict == FilterVerdict::Confirmed)
    }

    pub fn vetoed_by(&self) -> Option<&str> {
        self.evaluations
            .iter()
            .find(|e| e.verdict.is_veto())
            .map(|e| e.filter_name.as_str())
    }
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter. Order of calls is the order of evaluation.
    pub fn push(mut self, filter: Box<dyn AnalysisFilter>, enabled: bool) -> Self {
        self.stages.push(Stage { filter, enabled });
        self
    }

    pub fn enabled_count(&self) -> usize {
        self.stages.iter().filter(|s| s.enabled).count()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.stages.iter().any(|s| s.enabled && s.filter.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.filter.name()).collect()
    }

    pub fn run(&self, analysis: AnalysisResult, market: &MarketContext<'_>) -> PipelineOutcome {
        let original = (analysis.trend, analysis.confidence);
        let mut current = analysis;
        let mut evaluations = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let name = stage.filter.name().to_string();
            let before = (current.trend, current.confidence);

            if !stage.enabled {
                evaluations.push(FilterEvaluation {
                    filter_name: name,
                    verdict: FilterVerdict::Disabled,
                    before,
                    after: before,
                    filter_state: BTreeMap::new(),
                });
                continue;
            }

            let outcome = stage.filter.evaluate(current, market);
            current = outcome.analysis;
            let after = (current.trend, current.confidence);

            match outcome.verdict {
                FilterVerdict::Vetoed => info!(
                    filter = %name,
                    from = %before.0,
                    to = %after.0,
                    reason = %current.confidence_reason,
                    "filter vetoed trade"
                ),
                FilterVerdict::Bypassed | FilterVerdict::Confirmed => info!(
                    filter = %name,
                    verdict = outcome.verdict.as_str(),
                    confidence = %after.1,
                    "filter adjusted verdict"
                ),
                _ => debug!(filter = %name, verdict = outcome.verdict.as_str(), "filter evaluated"),
            }

            evaluations.push(FilterEvaluation {
                filter_name: name,
                verdict: outcome.verdict,
                before,
                after,
                filter_state: outcome.filter_state,
            });
        }

        if original != (current.trend, current.confidence) {
            info!(
                from_trend = %original.0,
                from_confidence = %original.1,
                to_trend = %current.trend,
                to_confidence = %current.confidence,
                "filters applied"
            );
        }

        PipelineOutcome {
            analysis: current,
            evaluations,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{analysis, empty_market};
    use super::*;

    struct AlwaysVeto;

    impl AnalysisFilter for AlwaysVeto {
        fn name(&self) -> &str {
            "always_veto"
        }

        fn evaluate(&self, analysis: AnalysisResult, _market: &MarketContext<'_>) -> FilterOutcome {
            if !analysis.is_directional() {
                return FilterOutcome::skipped(analysis);
            }
            FilterOutcome {
                analysis: analysis.vetoed("nope"),
                verdict: FilterVerdict::Vetoed,
                filter_state: BTreeMap::new(),
            }
        }
    }

    #[test]
    fn disabled_stage_is_reported_but_not_run() {
        let pipeline = FilterPipeline::new().push(Box::new(AlwaysVeto), false);
        let out = pipeline.run(analysis(TrendVote::Uptrend, Confidence::High), &empty_market());
        assert_eq!(out.analysis.trend, TrendVote::Uptrend);
        assert_eq!(out.evaluations.len(), 1);
        assert_eq!(out.evaluations[0].verdict, FilterVerdict::Disabled);
        assert_eq!(pipeline.enabled_count(), 0);
    }

    #[test]
    fn veto_records_transition() {
        let pipeline = FilterPipeline::new()
            .push(Box::new(AlwaysVeto), true)
            .push(Box::new(AlwaysVeto), true);
        let out = pipeline.run(analysis(TrendVote::Downtrend, Confidence::High), &empty_market());
        assert_eq!(out.analysis.trend, TrendVote::Sideways);
        assert_eq!(out.analysis.confidence, Confidence::Low);
        assert_eq!(out.analysis.confidence_reason, "nope");
        assert_eq!(out.evaluations[0].before, (TrendVote::Downtrend, Confidence::High));
        assert_eq!(out.evaluations[0].after, (TrendVote::Sideways, Confidence::Low));
        // Second stage sees a sideways verdict and leaves it alone.
        assert_eq!(out.evaluations[1].verdict, FilterVerdict::Skipped);
        assert_eq!(out.vetoed_by(), Some("always_veto"));
    }
}
