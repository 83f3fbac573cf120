use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rounding policy for prices and volumes sent to the broker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    /// Round to the nearest step.
    Nearest,
    /// Round toward zero (never exceeds the requested amount).
    Down,
}

/// Trading constraints of the one symbol this agent trades.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instrument {
    pub symbol: String,
    /// Lot increment accepted by the broker (e.g. 0.01).
    pub volume_step: f64,
    /// Smallest volume the broker accepts.
    pub min_volume: f64,
    /// Decimal places for prices (take-profit targets).
    pub price_digits: u32,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, volume_step: f64, min_volume: f64, price_digits: u32) -> Self {
        Self {
            symbol: symbol.into(),
            volume_step,
            min_volume,
            price_digits,
        }
    }

    /// Round a volume to the lot step, never going below the broker minimum.
    pub fn round_volume(&self, volume: f64, policy: RoundingPolicy) -> f64 {
        if self.volume_step <= 0.0 {
            return volume.max(self.min_volume);
        }
        let steps = volume / self.volume_step;
        // Absorb float noise such as 0.30000000000000004 before flooring.
        let steps = match policy {
            RoundingPolicy::Nearest => steps.round(),
            RoundingPolicy::Down => (steps + 1e-9).floor(),
        };
        let rounded = steps * self.volume_step;
        let digits = decimals_of(self.volume_step);
        round_to(rounded, digits).max(self.min_volume)
    }

    /// Round a price to the instrument's precision.
    pub fn round_price(&self, price: f64) -> f64 {
        round_to(price, self.price_digits)
    }

    /// Reject volumes that are not finite and positive.
    pub fn validate_volume(&self, volume: f64) -> Result<f64, InstrumentError> {
        if !volume.is_finite() || volume <= 0.0 {
            return Err(InstrumentError::InvalidVolume { volume });
        }
        Ok(self.round_volume(volume, RoundingPolicy::Nearest))
    }
}

fn decimals_of(step: f64) -> u32 {
    let mut digits = 0;
    let mut scaled = step;
    while digits < 8 && (scaled - scaled.round()).abs() > 1e-9 {
        scaled *= 10.0;
        digits += 1;
    }
    digits
}

fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}

#[derive(Debug, Error)]
pub enum InstrumentError {
    #[error("volume {volume} is not a positive finite number")]
    InvalidVolume { volume: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eth() -> Instrument {
        Instrument::new("ETHUSDm", 0.01, 0.01, 2)
    }

    #[test]
    fn volume_rounds_to_step() {
        let inst = eth();
        assert_eq!(inst.round_volume(0.1 * 3.0, RoundingPolicy::Nearest), 0.3);
        assert_eq!(inst.round_volume(0.275, RoundingPolicy::Down), 0.27);
        assert_eq!(inst.round_volume(0.276, RoundingPolicy::Nearest), 0.28);
    }

    #[test]
    fn volume_never_below_minimum() {
        assert_eq!(eth().round_volume(0.001, RoundingPolicy::Nearest), 0.01);
    }

    #[test]
    fn price_rounds_to_digits() {
        assert_eq!(eth().round_price(3171.7733), 3171.77);
    }

    #[test]
    fn validate_rejects_non_positive() {
        assert!(eth().validate_volume(0.0).is_err());
        assert!(eth().validate_volume(f64::NAN).is_err());
        assert_eq!(eth().validate_volume(0.2).unwrap(), 0.2);
    }
}
