use serde::{Deserialize, Serialize};

use super::position::Side;

/// The engine's sole output artifact when it decides to act.
///
/// `take_profit` is an absolute price unless `take_profit_is_relative`, in
/// which case it is a distance in pips from the fill price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeIntent {
    pub side: Side,
    pub lot_size: f64,
    pub take_profit: f64,
    pub take_profit_is_relative: bool,
}

impl TradeIntent {
    pub fn relative(side: Side, lot_size: f64, take_profit_pips: f64) -> Self {
        Self {
            side,
            lot_size,
            take_profit: take_profit_pips,
            take_profit_is_relative: true,
        }
    }

    pub fn absolute(side: Side, lot_size: f64, take_profit_price: f64) -> Self {
        Self {
            side,
            lot_size,
            take_profit: take_profit_price,
            take_profit_is_relative: false,
        }
    }
}
