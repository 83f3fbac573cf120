use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::PositionId;

/// Direction of a position or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1.0 for long, -1.0 for short.
    pub fn sign(&self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Long => "long",
            Side::Short => "short",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broker-owned open position, as seen in one cycle's snapshot.
///
/// The engine never mutates positions; it only requests modifications
/// through the broker gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub symbol: String,
    pub side: Side,
    pub entry_price: f64,
    pub current_price: f64,
    pub volume: f64,
    pub opened_at: DateTime<Utc>,
    /// Take-profit currently set at the broker, if any.
    pub take_profit: Option<f64>,
}

impl Position {
    /// Price movement in the position's favour (negative when under water).
    pub fn favourable_move(&self) -> f64 {
        (self.current_price - self.entry_price) * self.side.sign()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn position(side: Side, entry: f64, current: f64) -> Position {
        Position {
            id: PositionId::new("2975166898"),
            symbol: "ETHUSDm".into(),
            side,
            entry_price: entry,
            current_price: current,
            volume: 0.1,
            opened_at: Utc.with_ymd_and_hms(2025, 11, 15, 14, 0, 24).unwrap(),
            take_profit: None,
        }
    }

    #[test]
    fn favourable_move_is_signed_by_side() {
        assert_eq!(position(Side::Long, 3191.0, 3181.0).favourable_move(), -10.0);
        assert_eq!(position(Side::Short, 3191.0, 3181.0).favourable_move(), 10.0);
    }

    #[test]
    fn side_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Side::Short).unwrap(), "\"short\"");
    }
}
