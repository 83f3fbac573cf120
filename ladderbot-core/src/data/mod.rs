//! Collaborators: market data, positions, order gateway, and the REST adapter

pub mod canonicalize;
pub mod circuit_breaker;
pub mod daily_range;
pub mod metaapi;
pub mod provider;

pub use canonicalize::{canonicalize_candles, CanonicalCandles};
pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use daily_range::{intraday_range, last_daily_range, DailyRange, RangeSource};
pub use metaapi::{MetaApiClient, MetaApiConfig};
pub use provider::{
    BrokerError, BrokerGateway, DataError, MarketDataProvider, OrderConfirmation, OrderRequest,
    PositionStore,
};
