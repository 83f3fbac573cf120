//! Emergency RSI override — the last word before an entry is sent.
//!
//! Buys are refused when RSI is already stretched upward, sells when it is
//! stretched downward, whatever the rest of the pipeline concluded.

use serde::{Deserialize, Serialize};

use crate::domain::Side;

/// Why an entry was refused.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmergencyBlock {
    pub side: Side,
    pub rsi: f64,
    pub limit: f64,
}

#[derive(Debug, Clone)]
pub struct EmergencyOverride {
    pub enabled: bool,
    pub buy_block_rsi: f64,
    pub sell_block_rsi: f64,
}

impl Default for EmergencyOverride {
    fn default() -> Self {
        Self {
            enabled: true,
            buy_block_rsi: 65.0,
            sell_block_rsi: 35.0,
        }
    }
}

impl EmergencyOverride {
    /// `Some` when the entry on `side` must be blocked at this RSI.
    pub fn check(&self, side: Side, rsi: f64) -> Option<EmergencyBlock> {
        if !self.enabled {
            return None;
        }
        let blocked = match side {
            Side::Long => rsi >= self.buy_block_rsi,
            Side::Short => rsi <= self.sell_block_rsi,
        };
        blocked.then(|| EmergencyBlock {
            side,
            rsi,
            limit: match side {
                Side::Long => self.buy_block_rsi,
                Side::Short => self.sell_block_rsi,
            },
        })
    }
}
