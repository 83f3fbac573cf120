//! Policy configuration — every threshold the decision core reads.
//!
//! Loaded from TOML with `#[serde(default)]` on every section so a partial
//! file only overrides what it names. Variants (aggregator, sizing) are plain
//! enums here and are turned into trait objects once by `components::factory`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::components::analysis::Confidence;
use crate::components::filter::volatility::MaSelection;
use crate::domain::Instrument;

/// Errors raised while loading or validating a policy.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("failed to read policy file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse policy TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to render policy TOML: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("invalid policy value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> PolicyError {
    PolicyError::Invalid {
        field,
        reason: reason.into(),
    }
}

// ─── Variants ────────────────────────────────────────────────────────

/// Filter aggressiveness tier. Higher tiers demand more from the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Aggressiveness {
    #[default]
    Low,
    Medium,
    High,
}

impl Aggressiveness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggressiveness::Low => "LOW",
            Aggressiveness::Medium => "MEDIUM",
            Aggressiveness::High => "HIGH",
        }
    }
}

impl fmt::Display for Aggressiveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggressiveness {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Aggressiveness::Low),
            "MEDIUM" => Ok(Aggressiveness::Medium),
            "HIGH" => Ok(Aggressiveness::High),
            _ => Err(PolicyError::UnknownVariant {
                kind: "aggressiveness",
                value: s.to_string(),
            }),
        }
    }
}

/// One value per aggressiveness tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierTable {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl TierTable {
    pub const fn new(low: f64, medium: f64, high: f64) -> Self {
        Self { low, medium, high }
    }

    pub fn get(&self, tier: Aggressiveness) -> f64 {
        match tier {
            Aggressiveness::Low => self.low,
            Aggressiveness::Medium => self.medium,
            Aggressiveness::High => self.high,
        }
    }

    fn values(&self) -> [f64; 3] {
        [self.low, self.medium, self.high]
    }
}

/// Which aggregator turns timeframe votes into a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AggregatorPolicy {
    #[default]
    Strict,
    Graduated,
}

impl FromStr for AggregatorPolicy {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(AggregatorPolicy::Strict),
            "graduated" => Ok(AggregatorPolicy::Graduated),
            _ => Err(PolicyError::UnknownVariant {
                kind: "aggregator policy",
                value: s.to_string(),
            }),
        }
    }
}

/// Which sizer turns a verdict into a lot multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SizingPolicy {
    #[default]
    Fixed,
    Graduated,
}

impl FromStr for SizingPolicy {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(SizingPolicy::Fixed),
            "graduated" => Ok(SizingPolicy::Graduated),
            _ => Err(PolicyError::UnknownVariant {
                kind: "sizing policy",
                value: s.to_string(),
            }),
        }
    }
}

// ─── Sections ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub policy: AggregatorPolicy,
    /// Unanimous uptrends are only taken while RSI is below this cap.
    pub overbought_cap: f64,
    /// Unanimous downtrends are only taken while RSI is above this floor.
    pub oversold_floor: f64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            policy: AggregatorPolicy::Strict,
            overbought_cap: 75.0,
            oversold_floor: 25.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiConfig {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self {
            period: 14,
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    pub enabled: bool,
    pub period: usize,
    pub k: f64,
    /// Width ratio below which the 1h market counts as consolidating.
    pub thresholds: TierTable,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period: 10,
            k: 2.0,
            thresholds: TierTable::new(0.0150, 0.0369, 0.0540),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityConfig {
    pub enabled: bool,
    pub atr_period: usize,
    pub short_ma: usize,
    pub long_ma: usize,
    pub min_candles: usize,
    pub ma_selection: MaSelection,
    pub multipliers: TierTable,
    pub high_confidence_multiplier: f64,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            atr_period: 14,
            short_ma: 6,
            long_ma: 20,
            min_candles: 20,
            ma_selection: MaSelection::ByConfidence,
            multipliers: TierTable::new(0.5, 1.0, 1.5),
            high_confidence_multiplier: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HigherTimeframeConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportResistanceConfig {
    pub enabled: bool,
    /// Relative distance from the daily high/low that counts as "near".
    pub proximity: f64,
}

impl Default for SupportResistanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            proximity: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FiltersConfig {
    pub aggressiveness: Aggressiveness,
    pub consolidation: ConsolidationConfig,
    pub volatility: VolatilityConfig,
    pub higher_timeframe: HigherTimeframeConfig,
    pub support_resistance: SupportResistanceConfig,
}

impl FiltersConfig {
    pub fn enabled_count(&self) -> usize {
        [
            self.consolidation.enabled,
            self.volatility.enabled,
            self.higher_timeframe.enabled,
            self.support_resistance.enabled,
        ]
        .iter()
        .filter(|&&on| on)
        .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    pub policy: SizingPolicy,
    pub base: f64,
    pub rsi_bonus: f64,
    pub rsi_neutral_low: f64,
    pub rsi_neutral_high: f64,
    pub filter_bonus: f64,
    pub htf_bonus: f64,
    pub tier_scalars: TierTable,
    pub min_multiplier: f64,
    pub max_multiplier: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            policy: SizingPolicy::Fixed,
            base: 2.0,
            rsi_bonus: 0.5,
            rsi_neutral_low: 40.0,
            rsi_neutral_high: 60.0,
            filter_bonus: 0.15,
            htf_bonus: 0.2,
            tier_scalars: TierTable::new(1.0, 1.1, 1.2),
            min_multiplier: 0.5,
            max_multiplier: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyConfig {
    pub enabled: bool,
    /// Buys are blocked at or above this RSI.
    pub buy_block_rsi: f64,
    /// Sells are blocked at or below this RSI.
    pub sell_block_rsi: f64,
}

impl Default for EmergencyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            buy_block_rsi: 65.0,
            sell_block_rsi: 35.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LadderConfig {
    /// Price distance per rung used to space the ladder.
    pub pip_step: f64,
    /// Added to the mean entry (long) or subtracted (short) for the shared exit.
    pub take_profit_buffer: f64,
    /// Broker take-profits further than this from the shared target get repaired.
    pub repair_tolerance: f64,
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            pip_step: 10.0,
            take_profit_buffer: 2.0,
            repair_tolerance: 1e-6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryConfig {
    pub base_lot: f64,
    pub min_confidence: Confidence,
    pub take_profit_pips: f64,
    pub bypassed_take_profit_pips: f64,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            base_lot: 0.1,
            min_confidence: Confidence::High,
            take_profit_pips: 1000.0,
            bypassed_take_profit_pips: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    pub volume_step: f64,
    pub min_volume: f64,
    pub price_digits: u32,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            volume_step: 0.01,
            min_volume: 0.01,
            price_digits: 2,
        }
    }
}

impl InstrumentConfig {
    pub fn to_instrument(&self, symbol: &str) -> Instrument {
        Instrument::new(symbol, self.volume_step, self.min_volume, self.price_digits)
    }
}

// ─── Root ────────────────────────────────────────────────────────────

/// Complete decision policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PolicyConfig {
    pub aggregator: AggregatorConfig,
    pub rsi: RsiConfig,
    pub filters: FiltersConfig,
    pub sizing: SizingConfig,
    pub emergency: EmergencyConfig,
    pub ladder: LadderConfig,
    pub entry: EntryConfig,
    pub instrument: InstrumentConfig,
}

impl PolicyConfig {
    /// Parse a (possibly partial) TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, PolicyError> {
        let config: PolicyConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML policy file.
    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        let text = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, PolicyError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values that would make the decision logic meaningless.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.rsi.period == 0 {
            return Err(invalid("rsi.period", "must be >= 1"));
        }
        if !(0.0..=100.0).contains(&self.rsi.oversold)
            || !(0.0..=100.0).contains(&self.rsi.overbought)
            || self.rsi.oversold >= self.rsi.overbought
        {
            return Err(invalid(
                "rsi",
                format!(
                    "oversold ({}) must be below overbought ({}) within 0..=100",
                    self.rsi.oversold, self.rsi.overbought
                ),
            ));
        }
        if self.aggregator.oversold_floor >= self.aggregator.overbought_cap {
            return Err(invalid(
                "aggregator",
                format!(
                    "oversold_floor ({}) must be below overbought_cap ({})",
                    self.aggregator.oversold_floor, self.aggregator.overbought_cap
                ),
            ));
        }

        let consolidation = &self.filters.consolidation;
        if consolidation.period == 0 {
            return Err(invalid("filters.consolidation.period", "must be >= 1"));
        }
        if consolidation.k <= 0.0 {
            return Err(invalid("filters.consolidation.k", "must be > 0"));
        }
        if consolidation.thresholds.values().iter().any(|&t| t < 0.0) {
            return Err(invalid("filters.consolidation.thresholds", "must be >= 0"));
        }

        let volatility = &self.filters.volatility;
        if volatility.atr_period == 0 || volatility.short_ma == 0 || volatility.long_ma == 0 {
            return Err(invalid("filters.volatility", "periods must be >= 1"));
        }
        if volatility.short_ma > volatility.long_ma {
            return Err(invalid(
                "filters.volatility",
                format!(
                    "short_ma ({}) must not exceed long_ma ({})",
                    volatility.short_ma, volatility.long_ma
                ),
            ));
        }
        if volatility.multipliers.values().iter().any(|&m| m < 0.0)
            || volatility.high_confidence_multiplier < 0.0
        {
            return Err(invalid("filters.volatility.multipliers", "must be >= 0"));
        }

        if self.filters.support_resistance.proximity < 0.0 {
            return Err(invalid("filters.support_resistance.proximity", "must be >= 0"));
        }

        let sizing = &self.sizing;
        if sizing.min_multiplier <= 0.0 || sizing.min_multiplier > sizing.max_multiplier {
            return Err(invalid(
                "sizing",
                format!(
                    "need 0 < min_multiplier ({}) <= max_multiplier ({})",
                    sizing.min_multiplier, sizing.max_multiplier
                ),
            ));
        }
        if sizing.rsi_neutral_low > sizing.rsi_neutral_high {
            return Err(invalid("sizing", "rsi_neutral_low must not exceed rsi_neutral_high"));
        }

        if self.emergency.sell_block_rsi >= self.emergency.buy_block_rsi {
            return Err(invalid(
                "emergency",
                format!(
                    "sell_block_rsi ({}) must be below buy_block_rsi ({})",
                    self.emergency.sell_block_rsi, self.emergency.buy_block_rsi
                ),
            ));
        }

        if self.ladder.pip_step <= 0.0 {
            return Err(invalid("ladder.pip_step", "must be > 0"));
        }
        if self.ladder.repair_tolerance < 0.0 {
            return Err(invalid("ladder.repair_tolerance", "must be >= 0"));
        }

        if self.entry.base_lot <= 0.0 {
            return Err(invalid("entry.base_lot", "must be > 0"));
        }
        if self.entry.take_profit_pips <= 0.0 || self.entry.bypassed_take_profit_pips <= 0.0 {
            return Err(invalid("entry", "take-profit distances must be > 0"));
        }

        if self.instrument.volume_step <= 0.0 || self.instrument.min_volume <= 0.0 {
            return Err(invalid("instrument", "volume_step and min_volume must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        PolicyConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = PolicyConfig::from_toml_str(
            r#"
            [filters]
            aggressiveness = "HIGH"

            [filters.higher_timeframe]
            enabled = true

            [sizing]
            policy = "graduated"
            "#,
        )
        .unwrap();
        assert_eq!(config.filters.aggressiveness, Aggressiveness::High);
        assert!(config.filters.higher_timeframe.enabled);
        assert_eq!(config.sizing.policy, SizingPolicy::Graduated);
        assert_eq!(config.sizing.base, 2.0);
        assert_eq!(config.filters.consolidation.period, 10);
        assert_eq!(config.ladder.pip_step, 10.0);
        assert_eq!(config.entry.min_confidence, Confidence::High);
    }

    #[test]
    fn tier_table_lookup() {
        let thresholds = ConsolidationConfig::default().thresholds;
        assert_eq!(thresholds.get(Aggressiveness::Low), 0.0150);
        assert_eq!(thresholds.get(Aggressiveness::Medium), 0.0369);
        assert_eq!(thresholds.get(Aggressiveness::High), 0.0540);
    }

    #[test]
    fn rejects_inverted_rsi_band() {
        let mut config = PolicyConfig::default();
        config.rsi.oversold = 80.0;
        assert!(matches!(config.validate(), Err(PolicyError::Invalid { field: "rsi", .. })));
    }

    #[test]
    fn rejects_zero_period() {
        let mut config = PolicyConfig::default();
        config.filters.consolidation.period = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_min_above_max_multiplier() {
        let mut config = PolicyConfig::default();
        config.sizing.min_multiplier = 4.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_renders_and_parses_back() {
        let config = PolicyConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(PolicyConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn variant_names_parse() {
        assert_eq!("low".parse::<Aggressiveness>().unwrap(), Aggressiveness::Low);
        assert_eq!("Graduated".parse::<AggregatorPolicy>().unwrap(), AggregatorPolicy::Graduated);
        assert_eq!("fixed".parse::<SizingPolicy>().unwrap(), SizingPolicy::Fixed);
        assert!("reckless".parse::<Aggressiveness>().is_err());
    }

    #[test]
    fn counts_enabled_filters() {
        let mut filters = FiltersConfig::default();
        assert_eq!(filters.enabled_count(), 3);
        filters.higher_timeframe.enabled = true;
        assert_eq!(filters.enabled_count(), 4);
    }
}
