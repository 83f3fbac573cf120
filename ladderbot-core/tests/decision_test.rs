//! End-to-end decision tests: provider → snapshot → strategy → entry verdict.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::collections::HashMap;

use ladderbot_core::components::{AbstainReason, Confidence, EntryDecision, FilterVerdict, TrendVote};
use ladderbot_core::data::{DataError, MarketDataProvider};
use ladderbot_core::domain::{Candle, Side, Timeframe};
use ladderbot_core::engine::{gather_snapshot, CycleDecision, DecisionEngine};
use ladderbot_core::policy::PolicyConfig;

struct StaticProvider {
    series: HashMap<Timeframe, Vec<Candle>>,
}

impl MarketDataProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn get_candles(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Candle>, DataError> {
        self.series
            .get(&timeframe)
            .cloned()
            .ok_or_else(|| DataError::NoCandles {
                symbol: symbol.to_string(),
                timeframe,
            })
    }
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 15, 0, 0, 0).unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 15).unwrap()
}

fn series(closes: &[f64], step: Duration) -> Vec<Candle> {
    let mut prev = closes[0];
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let candle = Candle {
                open_time: start() + step * i as i32,
                open: prev,
                high: prev.max(close) + 1.0,
                low: prev.min(close) - 1.0,
                close,
            };
            prev = close;
            candle
        })
        .collect()
}

/// Alternating `up`/`down` steps from 3000, `n` closes.
fn zigzag(n: usize, up: f64, down: f64) -> Vec<f64> {
    let mut price = 3000.0;
    (0..n)
        .map(|i| {
            if i > 0 {
                price += if i % 2 == 1 { up } else { -down };
            }
            price
        })
        .collect()
}

fn ramp(n: usize, step: f64) -> Vec<f64> {
    (0..n).map(|i| 3000.0 + step * i as f64).collect()
}

fn provider(closes_5m: &[f64], step: f64) -> StaticProvider {
    StaticProvider {
        series: HashMap::from([
            (Timeframe::M5, series(closes_5m, Duration::minutes(5))),
            (Timeframe::M15, series(&ramp(40, step), Duration::minutes(15))),
            (Timeframe::H1, series(&ramp(60, step), Duration::hours(1))),
        ]),
    }
}

fn filters_off() -> PolicyConfig {
    let mut policy = PolicyConfig::default();
    policy.filters.consolidation.enabled = false;
    policy.filters.volatility.enabled = false;
    policy.filters.support_resistance.enabled = false;
    policy.filters.higher_timeframe.enabled = false;
    policy
}

fn decide(policy: &PolicyConfig, provider: &StaticProvider) -> (ladderbot_core::components::Analysis, EntryDecision) {
    let engine = DecisionEngine::from_policy(policy, policy.instrument.to_instrument("ETHUSDm"));
    match engine
        .decide(&[], |need_4h| gather_snapshot(provider, "ETHUSDm", need_4h, today()))
        .unwrap()
    {
        CycleDecision::Entry { analysis, decision } => (*analysis, decision),
        other => panic!("expected entry path, got {other:?}"),
    }
}

#[test]
fn unanimous_uptrend_with_flat_rsi_enters_long() {
    // A loss-free series reports the neutral RSI.
    let (analysis, decision) = decide(&filters_off(), &provider(&ramp(100, 1.0), 1.0));
    let result = analysis.result();
    assert_eq!(result.rsi, 50.0);
    assert_eq!(result.trend, TrendVote::Uptrend);
    assert_eq!(result.confidence, Confidence::High);
    match decision {
        EntryDecision::Enter { intent, .. } => {
            assert_eq!(intent.side, Side::Long);
            assert_eq!(intent.take_profit, 1000.0);
        }
        other => panic!("expected entry, got {other:?}"),
    }
}

#[test]
fn unanimous_downtrend_enters_short() {
    // +4/-5 steps: falling, RSI in the mid 40s (clear of the floor and the sell block).
    let (analysis, decision) = decide(&filters_off(), &provider(&zigzag(120, 4.0, 5.0), -1.0));
    assert_eq!(analysis.result().trend, TrendVote::Downtrend);
    assert!(matches!(decision, EntryDecision::Enter { ref intent, .. } if intent.side == Side::Short));
}

#[test]
fn overbought_rsi_turns_unanimous_uptrend_sideways() {
    // +5/-1 steps hold RSI near 83.
    let (analysis, decision) = decide(&filters_off(), &provider(&zigzag(120, 5.0, 1.0), 1.0));
    let result = analysis.result();
    assert!(result.rsi >= 75.0, "rsi {}", result.rsi);
    assert_eq!(result.trend, TrendVote::Sideways);
    assert!(result.confidence_reason.contains("overbought"), "{}", result.confidence_reason);
    assert!(matches!(decision, EntryDecision::Abstain(AbstainReason::NoTrend { .. })));
}

#[test]
fn emergency_override_blocks_stretched_buy() {
    // +2/-1 steps hold RSI between 65 and 70: past the buy block, under the cap.
    let (analysis, decision) = decide(&filters_off(), &provider(&zigzag(120, 2.0, 1.0), 1.0));
    let result = analysis.result();
    assert!((65.0..75.0).contains(&result.rsi), "rsi {}", result.rsi);
    assert_eq!(result.trend, TrendVote::Uptrend);
    match decision {
        EntryDecision::Abstain(AbstainReason::EmergencyBlock(block)) => {
            assert_eq!(block.side, Side::Long);
            assert_eq!(block.limit, 65.0);
        }
        other => panic!("expected emergency block, got {other:?}"),
    }
}

#[test]
fn missing_higher_timeframes_vote_sideways() {
    let provider = StaticProvider {
        series: HashMap::from([(Timeframe::M5, series(&ramp(100, 1.0), Duration::minutes(5)))]),
    };
    let (analysis, decision) = decide(&filters_off(), &provider);
    let result = analysis.result();
    assert_eq!(result.votes.m5, TrendVote::Uptrend);
    assert_eq!(result.votes.m15, TrendVote::Sideways);
    assert_eq!(result.votes.h1, TrendVote::Sideways);
    assert_eq!(result.trend, TrendVote::Sideways);
    assert!(matches!(decision, EntryDecision::Abstain(_)));
}

#[test]
fn default_pipeline_reports_every_filter_in_order() {
    let (analysis, _) = decide(&PolicyConfig::default(), &provider(&ramp(100, 1.0), 1.0));
    let names: Vec<&str> = analysis
        .outcome
        .evaluations
        .iter()
        .map(|e| e.filter_name.as_str())
        .collect();
    assert_eq!(
        names,
        [
            "consolidation_filter",
            "volatility_filter",
            "higher_timeframe_filter",
            "support_resistance_filter"
        ]
    );
    assert_eq!(analysis.outcome.evaluations[2].verdict, FilterVerdict::Disabled);
    assert_eq!(analysis.raw.trend, TrendVote::Uptrend);
}

#[test]
fn missing_5m_series_fails_the_cycle() {
    let provider = StaticProvider { series: HashMap::new() };
    let policy = PolicyConfig::default();
    let engine = DecisionEngine::from_policy(&policy, policy.instrument.to_instrument("ETHUSDm"));
    let result = engine.decide(&[], |need_4h| gather_snapshot(&provider, "ETHUSDm", need_4h, today()));
    assert!(result.is_err());
}
