//! Environment settings — credentials, endpoints and policy overrides.
//!
//! Read once at startup. A `.env` file is loaded first (the `DOTENV`
//! variable or `--env-file` picks another one), then `POLICY_FILE`, then the
//! individual keys, which override whatever the policy file says.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use ladderbot_core::domain::Instrument;
use ladderbot_core::policy::{
    AggregatorPolicy, Aggressiveness, PolicyConfig, PolicyError, SizingPolicy,
};

pub const DEFAULT_SYMBOL: &str = "ETHUSDm";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_ORDER_COMMENT: &str = "ladderbot";

/// Errors from settings loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("failed to load env file {path}: {reason}")]
    EnvFile { path: String, reason: String },
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub account_id: String,
    pub base_url: String,
    pub market_base_url: String,
    pub symbol: String,
    pub poll_interval: Duration,
    pub order_comment: String,
    pub policy: PolicyConfig,
}

impl Settings {
    /// Load `.env` (optional), then read the process environment.
    pub fn from_env(env_file: Option<&Path>, policy_file: Option<&Path>) -> Result<Self, ConfigError> {
        load_env_file(env_file)?;
        Self::from_lookup(|key| std::env::var(key).ok(), policy_file)
    }

    /// Build settings from any key lookup. `policy_file` wins over `POLICY_FILE`.
    pub fn from_lookup<F>(lookup: F, policy_file: Option<&Path>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let settings = Self {
            api_key: required("API_KEY")?,
            account_id: required("ACCOUNT_ID")?,
            base_url: required("REGION_BASE_URL")?,
            market_base_url: required("REGION_MARKET_BASE_URL")?,
            symbol: lookup("PAIR_SYMBOL").unwrap_or_else(|| DEFAULT_SYMBOL.to_string()),
            poll_interval: Duration::from_secs(
                parse_opt(&lookup, "POLL_INTERVAL_SECS")?.unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            ),
            order_comment: lookup("ORDER_COMMENT")
                .unwrap_or_else(|| DEFAULT_ORDER_COMMENT.to_string()),
            policy: policy_from_lookup(&lookup, policy_file)?,
        };
        if settings.poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "POLL_INTERVAL_SECS",
                value: "0".into(),
                reason: "must be > 0".into(),
            });
        }

        info!(
            symbol = %settings.symbol,
            account = %settings.account_id,
            poll_interval_secs = settings.poll_interval.as_secs(),
            policy = settings.policy.fingerprint().short(),
            "settings loaded"
        );
        Ok(settings)
    }

    pub fn instrument(&self) -> Instrument {
        self.policy.instrument.to_instrument(&self.symbol)
    }
}

/// Load the env file named by `explicit`, else `DOTENV`, else `.env` if present.
pub fn load_env_file(explicit: Option<&Path>) -> Result<(), ConfigError> {
    let named = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var("DOTENV").ok().map(PathBuf::from));
    match named {
        Some(path) => {
            dotenvy::from_path(&path).map_err(|e| ConfigError::EnvFile {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            debug!(path = %path.display(), "env file loaded");
        }
        None => {
            if let Ok(path) = dotenvy::dotenv() {
                debug!(path = %path.display(), "env file loaded");
            }
        }
    }
    Ok(())
}

/// Policy from `POLICY_FILE` (or `policy_file`) with env overrides applied and validated.
pub fn policy_from_lookup<F>(lookup: &F, policy_file: Option<&Path>) -> Result<PolicyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let path = policy_file
        .map(Path::to_path_buf)
        .or_else(|| lookup("POLICY_FILE").map(PathBuf::from));
    let mut policy = match path {
        Some(path) => {
            info!(path = %path.display(), "loading policy file");
            PolicyConfig::load(&path)?
        }
        None => PolicyConfig::default(),
    };

    if let Some(lot) = parse_opt::<f64, _>(lookup, "INITIAL_LOT_SIZE")? {
        policy.entry.base_lot = lot;
    }
    if let Some(buffer) = parse_opt::<f64, _>(lookup, "TAKE_PROFIT_BUFFER")? {
        policy.ladder.take_profit_buffer = buffer;
    }
    if let Some(step) = parse_opt::<f64, _>(lookup, "PIP_STEP")? {
        policy.ladder.pip_step = step;
    }
    if let Some(on) = parse_bool(lookup, "ENABLE_CONSOLIDATION_FILTER")? {
        policy.filters.consolidation.enabled = on;
    }
    if let Some(on) = parse_bool(lookup, "ENABLE_VOLATILITY_FILTER")? {
        policy.filters.volatility.enabled = on;
    }
    if let Some(on) = parse_bool(lookup, "ENABLE_4H_CONFIRMATION")? {
        policy.filters.higher_timeframe.enabled = on;
    }
    if let Some(on) = parse_bool(lookup, "ENABLE_SUPPORT_RESISTANCE_FILTER")? {
        policy.filters.support_resistance.enabled = on;
    }
    if let Some(tier) = lookup("FILTER_AGGRESSIVENESS") {
        policy.filters.aggressiveness = Aggressiveness::from_str(&tier)?;
    }
    if let Some(variant) = lookup("AGGREGATOR_POLICY") {
        policy.aggregator.policy = AggregatorPolicy::from_str(&variant)?;
    }
    if let Some(variant) = lookup("SIZING_POLICY") {
        policy.sizing.policy = SizingPolicy::from_str(&variant)?;
    }

    policy.validate()?;
    Ok(policy)
}

fn parse_opt<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| {
            value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}

fn parse_bool<F>(lookup: &F, key: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                key,
                value,
                reason: "expected true or false".into(),
            }),
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const CREDS: [(&str, &str); 4] = [
        ("API_KEY", "key"),
        ("ACCOUNT_ID", "acct"),
        ("REGION_BASE_URL", "https://trade.example"),
        ("REGION_MARKET_BASE_URL", "https://market.example"),
    ];

    #[test]
    fn defaults_with_credentials_only() {
        let settings = Settings::from_lookup(env(&CREDS), None).unwrap();
        assert_eq!(settings.symbol, "ETHUSDm");
        assert_eq!(settings.poll_interval, Duration::from_secs(300));
        assert_eq!(settings.policy, PolicyConfig::default());
        assert_eq!(settings.instrument().symbol, "ETHUSDm");
    }

    #[test]
    fn missing_credential_is_reported_by_name() {
        let err = Settings::from_lookup(env(&CREDS[..3]), None).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("REGION_MARKET_BASE_URL")));

        let mut pairs = CREDS.to_vec();
        pairs[0] = ("API_KEY", "  ");
        let err = Settings::from_lookup(env(&pairs), None).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("API_KEY")));
    }

    #[test]
    fn env_keys_override_policy() {
        let mut pairs = CREDS.to_vec();
        pairs.extend([
            ("PAIR_SYMBOL", "BTCUSDm"),
            ("INITIAL_LOT_SIZE", "0.2"),
            ("TAKE_PROFIT_BUFFER", "3.5"),
            ("ENABLE_CONSOLIDATION_FILTER", "false"),
            ("ENABLE_4H_CONFIRMATION", "TRUE"),
            ("FILTER_AGGRESSIVENESS", "high"),
            ("AGGREGATOR_POLICY", "graduated"),
            ("SIZING_POLICY", "graduated"),
            ("PIP_STEP", "15"),
            ("POLL_INTERVAL_SECS", "60"),
        ]);
        let settings = Settings::from_lookup(env(&pairs), None).unwrap();
        let p = &settings.policy;
        assert_eq!(settings.symbol, "BTCUSDm");
        assert_eq!(settings.poll_interval, Duration::from_secs(60));
        assert_eq!(p.entry.base_lot, 0.2);
        assert_eq!(p.ladder.take_profit_buffer, 3.5);
        assert_eq!(p.ladder.pip_step, 15.0);
        assert!(!p.filters.consolidation.enabled);
        assert!(p.filters.higher_timeframe.enabled);
        assert_eq!(p.filters.aggressiveness, Aggressiveness::High);
        assert_eq!(p.aggregator.policy, AggregatorPolicy::Graduated);
        assert_eq!(p.sizing.policy, SizingPolicy::Graduated);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let mut pairs = CREDS.to_vec();
        pairs.push(("INITIAL_LOT_SIZE", "lots"));
        assert!(matches!(
            Settings::from_lookup(env(&pairs), None).unwrap_err(),
            ConfigError::Invalid { key: "INITIAL_LOT_SIZE", .. }
        ));

        let mut pairs = CREDS.to_vec();
        pairs.push(("ENABLE_VOLATILITY_FILTER", "maybe"));
        assert!(matches!(
            Settings::from_lookup(env(&pairs), None).unwrap_err(),
            ConfigError::Invalid { key: "ENABLE_VOLATILITY_FILTER", .. }
        ));

        let mut pairs = CREDS.to_vec();
        pairs.push(("FILTER_AGGRESSIVENESS", "EXTREME"));
        assert!(matches!(
            Settings::from_lookup(env(&pairs), None).unwrap_err(),
            ConfigError::Policy(PolicyError::UnknownVariant { .. })
        ));
    }

    #[test]
    fn overrides_are_validated() {
        let mut pairs = CREDS.to_vec();
        pairs.push(("PIP_STEP", "0"));
        assert!(matches!(
            Settings::from_lookup(env(&pairs), None).unwrap_err(),
            ConfigError::Policy(PolicyError::Invalid { .. })
        ));
    }

    #[test]
    fn missing_policy_file_is_an_error() {
        let mut pairs = CREDS.to_vec();
        pairs.push(("POLICY_FILE", "/nonexistent/ladderbot-policy.toml"));
        assert!(matches!(
            Settings::from_lookup(env(&pairs), None).unwrap_err(),
            ConfigError::Policy(PolicyError::Io { .. })
        ));
    }
}
