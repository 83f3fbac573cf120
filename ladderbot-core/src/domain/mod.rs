//! Domain types for the ladder agent.

pub mod candle;
pub mod ids;
pub mod instrument;
pub mod intent;
pub mod position;

pub use candle::{closes, Candle, Timeframe, UnknownTimeframe};
pub use ids::{OrderId, PolicyHash, PositionId};
pub use instrument::{Instrument, InstrumentError, RoundingPolicy};
pub use intent::TradeIntent;
pub use position::{Position, Side};
