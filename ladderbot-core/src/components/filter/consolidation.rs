//! Consolidation filter — avoids ranging markets on the 1h chart.
//!
//! A Bollinger width ratio below the tier threshold means the market is
//! consolidating. Unanimous timeframe alignment waives the veto but flags the
//! result so the entry uses the reduced take-profit.

use std::collections::BTreeMap;

use super::{AnalysisFilter, FilterOutcome, FilterVerdict, MarketContext};
use crate::components::analysis::AnalysisResult;
use crate::indicators::bollinger_width_ratio;

pub const NAME: &str = "consolidation_filter";

#[derive(Debug, Clone)]
pub struct ConsolidationFilter {
    pub period: usize,
    pub k: f64,
    pub threshold: f64,
}

impl ConsolidationFilter {
    pub fn new(period: usize, k: f64, threshold: f64) -> Self {
        Self { period, k, threshold }
    }
}

impl AnalysisFilter for ConsolidationFilter {
    fn name(&self) -> &str {
        NAME
    }

    fn evaluate(&self, analysis: AnalysisResult, market: &MarketContext<'_>) -> FilterOutcome {
        if !analysis.is_directional() {
            return FilterOutcome::skipped(analysis);
        }
        let Some(candles_1h) = market.candles_1h else {
            return FilterOutcome::skipped(analysis);
        };
        if candles_1h.len() < self.period {
            return FilterOutcome::skipped(analysis);
        }
        let Some(ratio) = bollinger_width_ratio(candles_1h, self.period, self.k) else {
            return FilterOutcome::skipped(analysis);
        };

        let mut state = BTreeMap::new();
        state.insert("width_ratio".into(), ratio);
        state.insert("threshold".into(), self.threshold);

        if ratio >= self.threshold {
            return FilterOutcome {
                analysis,
                verdict: FilterVerdict::Passed,
                filter_state: state,
            };
        }

        if analysis.alignment.is_unanimous() {
            let analysis = AnalysisResult {
                consolidation_bypassed: true,
                ..analysis
            };
            FilterOutcome {
                analysis,
                verdict: FilterVerdict::Bypassed,
                filter_state: state,
            }
        } else {
            FilterOutcome {
                analysis: analysis.vetoed("Market in consolidation - avoiding trade"),
                verdict: FilterVerdict::Vetoed,
                filter_state: state,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::analysis::{Alignment, Confidence};
    use crate::components::filter::test_support::{analysis, empty_market};
    use crate::components::trend::TrendVote;
    use crate::indicators::make_candles;

    fn filter() -> ConsolidationFilter {
        ConsolidationFilter::new(10, 2.0, 0.0150)
    }

    fn tight_1h() -> Vec<crate::domain::Candle> {
        make_candles(&[3000.0, 3001.0, 3000.0, 3001.0, 3000.0, 3001.0, 3000.0, 3001.0, 3000.0, 3001.0])
    }

    fn wide_1h() -> Vec<crate::domain::Candle> {
        make_candles(&[2800.0, 3200.0, 2800.0, 3200.0, 2800.0, 3200.0, 2800.0, 3200.0, 2800.0, 3200.0])
    }

    #[test]
    fn tight_range_vetoes_majority_trend() {
        let candles = tight_1h();
        let market = MarketContext { candles_1h: Some(&candles), ..empty_market() };
        let mut input = analysis(TrendVote::Uptrend, Confidence::Medium);
        input.alignment = Alignment::MajorityUptrend;
        let out = filter().evaluate(input, &market);
        assert_eq!(out.verdict, FilterVerdict::Vetoed);
        assert_eq!(out.analysis.trend, TrendVote::Sideways);
        assert_eq!(out.analysis.confidence_reason, "Market in consolidation - avoiding trade");
        assert!(out.filter_state["width_ratio"] < 0.0150);
    }

    #[test]
    fn tight_range_bypassed_when_unanimous() {
        let candles = tight_1h();
        let market = MarketContext { candles_1h: Some(&candles), ..empty_market() };
        let out = filter().evaluate(analysis(TrendVote::Uptrend, Confidence::High), &market);
        assert_eq!(out.verdict, FilterVerdict::Bypassed);
        assert_eq!(out.analysis.trend, TrendVote::Uptrend);
        assert!(out.analysis.consolidation_bypassed);
    }

    #[test]
    fn wide_range_passes() {
        let candles = wide_1h();
        let market = MarketContext { candles_1h: Some(&candles), ..empty_market() };
        let out = filter().evaluate(analysis(TrendVote::Downtrend, Confidence::High), &market);
        assert_eq!(out.verdict, FilterVerdict::Passed);
        assert!(!out.analysis.consolidation_bypassed);
    }

    #[test]
    fn missing_or_short_1h_is_skipped() {
        let out = filter().evaluate(analysis(TrendVote::Uptrend, Confidence::High), &empty_market());
        assert_eq!(out.verdict, FilterVerdict::Skipped);

        let candles = make_candles(&[3000.0; 9]);
        let market = MarketContext { candles_1h: Some(&candles), ..empty_market() };
        let out = filter().evaluate(analysis(TrendVote::Uptrend, Confidence::High), &market);
        assert_eq!(out.verdict, FilterVerdict::Skipped);
    }
}
