//! Factory system — converts `PolicyConfig` into runtime trait objects.
//!
//! Variants are resolved exactly once at startup; the decision path only
//! ever sees `Box<dyn ...>`.

use super::aggregator::{GraduatedAggregator, RsiBands, SignalAggregator, StrictAggregator};
use super::filter::{
    ConsolidationFilter, FilterPipeline, HigherTimeframeFilter, SupportResistanceFilter,
    VolatilityFilter,
};
use crate::policy::{AggregatorPolicy, PolicyConfig, SizingPolicy};
use crate::sizers::{EmergencyOverride, FixedSizer, GraduatedSizer, Sizer};

// ─── Aggregator factory ──────────────────────────────────────────────

pub fn create_aggregator(policy: &PolicyConfig) -> Box<dyn SignalAggregator> {
    let bands = RsiBands::from_config(&policy.aggregator, &policy.rsi);
    match policy.aggregator.policy {
        AggregatorPolicy::Strict => Box::new(StrictAggregator::new(bands)),
        AggregatorPolicy::Graduated => Box::new(GraduatedAggregator::new(bands)),
    }
}

// ─── Filter factory ──────────────────────────────────────────────────

/// Fixed order: consolidation, volatility, higher timeframe, support/resistance.
pub fn create_pipeline(policy: &PolicyConfig) -> FilterPipeline {
    let filters = &policy.filters;
    let tier = filters.aggressiveness;

    let consolidation = ConsolidationFilter::new(
        filters.consolidation.period,
        filters.consolidation.k,
        filters.consolidation.thresholds.get(tier),
    );

    let v = &filters.volatility;
    let volatility = VolatilityFilter {
        atr_period: v.atr_period,
        short_ma: v.short_ma,
        long_ma: v.long_ma,
        min_candles: v.min_candles,
        ma_selection: v.ma_selection,
        tier_multiplier: v.multipliers.get(tier),
        high_confidence_multiplier: v.high_confidence_multiplier,
    };

    let support_resistance = SupportResistanceFilter::new(
        filters.support_resistance.proximity,
        policy.rsi.oversold,
        policy.rsi.overbought,
    );

    FilterPipeline::new()
        .push(Box::new(consolidation), filters.consolidation.enabled)
        .push(Box::new(volatility), v.enabled)
        .push(Box::new(HigherTimeframeFilter), filters.higher_timeframe.enabled)
        .push(Box::new(support_resistance), filters.support_resistance.enabled)
}

// ─── Sizer factory ───────────────────────────────────────────────────

pub fn create_sizer(policy: &PolicyConfig) -> Box<dyn Sizer> {
    let s = &policy.sizing;
    match s.policy {
        SizingPolicy::Fixed => Box::new(FixedSizer),
        SizingPolicy::Graduated => Box::new(GraduatedSizer {
            base: s.base,
            rsi_bonus: s.rsi_bonus,
            rsi_neutral_low: s.rsi_neutral_low,
            rsi_neutral_high: s.rsi_neutral_high,
            filter_bonus: s.filter_bonus,
            enabled_filters: policy.filters.enabled_count(),
            htf_bonus: s.htf_bonus,
            tier_scalar: s.tier_scalars.get(policy.filters.aggressiveness),
            min_multiplier: s.min_multiplier,
            max_multiplier: s.max_multiplier,
        }),
    }
}

pub fn create_emergency(policy: &PolicyConfig) -> EmergencyOverride {
    EmergencyOverride {
        enabled: policy.emergency.enabled,
        buy_block_rsi: policy.emergency.buy_block_rsi,
        sell_block_rsi: policy.emergency.sell_block_rsi,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Aggressiveness;

    #[test]
    fn default_policy_builds_strict_and_fixed() {
        let policy = PolicyConfig::default();
        assert_eq!(create_aggregator(&policy).name(), "strict");
        assert_eq!(create_sizer(&policy).name(), "fixed");
    }

    #[test]
    fn graduated_variants() {
        let mut policy = PolicyConfig::default();
        policy.aggregator.policy = AggregatorPolicy::Graduated;
        policy.sizing.policy = SizingPolicy::Graduated;
        assert_eq!(create_aggregator(&policy).name(), "graduated");
        assert_eq!(create_sizer(&policy).name(), "graduated");
    }

    #[test]
    fn pipeline_order_and_toggles() {
        let mut policy = PolicyConfig::default();
        policy.filters.aggressiveness = Aggressiveness::Medium;
        let pipeline = create_pipeline(&policy);
        assert_eq!(
            pipeline.names(),
            vec![
                "consolidation_filter",
                "volatility_filter",
                "higher_timeframe_filter",
                "support_resistance_filter"
            ]
        );
        assert_eq!(pipeline.enabled_count(), 3);

        policy.filters.volatility.enabled = false;
        assert_eq!(create_pipeline(&policy).enabled_count(), 2);
    }
}
