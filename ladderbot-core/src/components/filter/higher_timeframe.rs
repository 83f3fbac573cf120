//! Higher-timeframe confirmation — the 4h trend must not contradict the
//! verdict; agreement upgrades medium confidence to high.

use std::collections::BTreeMap;

use super::{AnalysisFilter, FilterOutcome, FilterVerdict, MarketContext};
use crate::components::analysis::{AnalysisResult, Confidence};
use crate::components::trend::{classify_trend, TrendVote};
use crate::domain::Timeframe;

pub const NAME: &str = "higher_timeframe_filter";

#[derive(Debug, Clone, Default)]
pub struct HigherTimeframeFilter;

fn vote_code(vote: TrendVote) -> f64 {
    match vote {
        TrendVote::Uptrend => 1.0,
        TrendVote::Downtrend => -1.0,
        TrendVote::Sideways => 0.0,
    }
}

impl AnalysisFilter for HigherTimeframeFilter {
    fn name(&self) -> &str {
        NAME
    }

    fn evaluate(&self, analysis: AnalysisResult, market: &MarketContext<'_>) -> FilterOutcome {
        if !analysis.is_directional() {
            return FilterOutcome::skipped(analysis);
        }
        let Some(candles_4h) = market.candles_4h.filter(|c| !c.is_empty()) else {
            return FilterOutcome::skipped(analysis);
        };

        let trend_4h = classify_trend(candles_4h, Timeframe::H4);
        let mut state = BTreeMap::new();
        state.insert("trend_4h".into(), vote_code(trend_4h));

        if trend_4h == TrendVote::Sideways {
            return FilterOutcome {
                analysis,
                verdict: FilterVerdict::Passed,
                filter_state: state,
            };
        }

        if trend_4h != analysis.trend {
            let reason = format!("4H trend ({trend_4h}) contradicts lower timeframe trend");
            return FilterOutcome {
                analysis: analysis.vetoed(reason),
                verdict: FilterVerdict::Vetoed,
                filter_state: state,
            };
        }

        let confidence = match analysis.confidence {
            Confidence::Medium => Confidence::High,
            other => other,
        };
        let confidence_reason = format!("{} (confirmed by 4H)", analysis.confidence_reason);
        FilterOutcome {
            analysis: AnalysisResult {
                confidence,
                confidence_reason,
                ..analysis
            },
            verdict: FilterVerdict::Confirmed,
            filter_state: state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::filter::test_support::{analysis, empty_market};
    use crate::indicators::make_candles;

    fn candles(step: f64) -> Vec<crate::domain::Candle> {
        let closes: Vec<f64> = (0..40).map(|i| 3000.0 + step * i as f64).collect();
        make_candles(&closes)
    }

    #[test]
    fn agreeing_4h_upgrades_medium() {
        let up = candles(2.0);
        let market = MarketContext { candles_4h: Some(&up), ..empty_market() };
        let out = HigherTimeframeFilter.evaluate(analysis(TrendVote::Uptrend, Confidence::Medium), &market);
        assert_eq!(out.verdict, FilterVerdict::Confirmed);
        assert_eq!(out.analysis.confidence, Confidence::High);
        assert_eq!(out.analysis.confidence_reason, "test (confirmed by 4H)");
    }

    #[test]
    fn contradicting_4h_vetoes() {
        let down = candles(-2.0);
        let market = MarketContext { candles_4h: Some(&down), ..empty_market() };
        let out = HigherTimeframeFilter.evaluate(analysis(TrendVote::Uptrend, Confidence::High), &market);
        assert_eq!(out.verdict, FilterVerdict::Vetoed);
        assert_eq!(out.analysis.trend, TrendVote::Sideways);
        assert_eq!(
            out.analysis.confidence_reason,
            "4H trend (downtrend) contradicts lower timeframe trend"
        );
    }

    #[test]
    fn sideways_4h_passes_unchanged() {
        let flat = candles(0.0);
        let market = MarketContext { candles_4h: Some(&flat), ..empty_market() };
        let input = analysis(TrendVote::Downtrend, Confidence::Medium);
        let out = HigherTimeframeFilter.evaluate(input.clone(), &market);
        assert_eq!(out.verdict, FilterVerdict::Passed);
        assert_eq!(out.analysis, input);
    }

    #[test]
    fn missing_4h_is_skipped() {
        let out = HigherTimeframeFilter.evaluate(analysis(TrendVote::Uptrend, Confidence::High), &empty_market());
        assert_eq!(out.verdict, FilterVerdict::Skipped);
    }
}
