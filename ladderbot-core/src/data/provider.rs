//! Collaborator traits and structured error types.
//!
//! The decision core talks to the outside world through three traits so the
//! REST adapter can be swapped for in-memory fakes in tests or a dry-run
//! gateway on the CLI.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Candle, OrderId, Position, PositionId, Side, Timeframe, TradeIntent};

/// Structured error types for market data and position reads.
///
/// These are designed to be displayable in log lines as-is.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("hard stop: provider calls suspended (circuit breaker open)")]
    CircuitBreakerTripped,

    #[error("HTTP {status} from {context}")]
    Http { status: u16, context: String },

    #[error("no {timeframe} candles returned for {symbol}")]
    NoCandles { symbol: String, timeframe: Timeframe },

    #[error("data error: {0}")]
    Other(String),
}

/// Structured error types for order placement and modification.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("order rejected ({code}): {message}")]
    Rejected { code: String, message: String },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("hard stop: broker calls suspended (circuit breaker open)")]
    CircuitBreakerTripped,

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("invalid order: {0}")]
    InvalidOrder(String),
}

/// Everything the gateway needs to place one market order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub volume: f64,
    pub take_profit: f64,
    pub take_profit_is_relative: bool,
    pub comment: String,
}

impl OrderRequest {
    pub fn from_intent(symbol: &str, intent: &TradeIntent, comment: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            side: intent.side,
            volume: intent.lot_size,
            take_profit: intent.take_profit,
            take_profit_is_relative: intent.take_profit_is_relative,
            comment: comment.to_string(),
        }
    }
}

/// Broker acknowledgement of a trade request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub numeric_code: i64,
    pub string_code: String,
    pub message: String,
    pub order_id: Option<OrderId>,
    pub position_id: Option<PositionId>,
}

/// Source of OHLC candles.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Recent candles for `symbol`, oldest first.
    fn get_candles(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Candle>, DataError>;
}

/// Read-only view of the broker's open positions.
pub trait PositionStore: Send + Sync {
    /// Open positions on `symbol`, oldest-opened first.
    fn get_positions(&self, symbol: &str) -> Result<Vec<Position>, DataError>;
}

/// Order placement and take-profit modification.
pub trait BrokerGateway: Send + Sync {
    fn name(&self) -> &str;

    fn place_order(&self, request: &OrderRequest) -> Result<OrderConfirmation, BrokerError>;

    fn modify_position(
        &self,
        position_id: &PositionId,
        take_profit: f64,
    ) -> Result<OrderConfirmation, BrokerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_request_copies_intent() {
        let intent = TradeIntent::relative(Side::Short, 0.1, 1000.0);
        let request = OrderRequest::from_intent("ETHUSDm", &intent, "ladderbot");
        assert_eq!(request.side, Side::Short);
        assert_eq!(request.volume, 0.1);
        assert_eq!(request.take_profit, 1000.0);
        assert!(request.take_profit_is_relative);
        assert_eq!(request.symbol, "ETHUSDm");
    }

    #[test]
    fn errors_are_displayable() {
        let err = DataError::Http {
            status: 502,
            context: "positions".into(),
        };
        assert_eq!(err.to_string(), "HTTP 502 from positions");
        let err = BrokerError::Rejected {
            code: "TRADE_RETCODE_NO_MONEY".into(),
            message: "not enough money".into(),
        };
        assert!(err.to_string().contains("TRADE_RETCODE_NO_MONEY"));
    }
}
