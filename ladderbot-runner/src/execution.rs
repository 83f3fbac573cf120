//! Order execution — turns intents and take-profit plans into gateway calls.
//!
//! Orders are never retried here. A failed modification is logged and the
//! remaining rungs are still attempted; the next cycle's drift check picks up
//! whatever is left.

use std::sync::Arc;

use tracing::{error, info, warn};

use ladderbot_core::data::{BrokerError, BrokerGateway, OrderConfirmation, OrderRequest};
use ladderbot_core::domain::{Instrument, TradeIntent};
use ladderbot_core::position_management::TakeProfitRepair;

/// Result of pushing a batch of take-profits to the broker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TakeProfitSummary {
    pub applied: usize,
    pub failed: usize,
}

pub struct OrderExecutor {
    gateway: Arc<dyn BrokerGateway>,
    instrument: Instrument,
    comment: String,
}

impl OrderExecutor {
    pub fn new(gateway: Arc<dyn BrokerGateway>, instrument: Instrument, comment: impl Into<String>) -> Self {
        Self {
            gateway,
            instrument,
            comment: comment.into(),
        }
    }

    pub fn gateway_name(&self) -> &str {
        self.gateway.name()
    }

    /// Place a market order for `intent` on the configured symbol.
    pub fn place(&self, intent: &TradeIntent) -> Result<OrderConfirmation, BrokerError> {
        let volume = self
            .instrument
            .validate_volume(intent.lot_size)
            .map_err(|e| BrokerError::InvalidOrder(e.to_string()))?;
        let mut request = OrderRequest::from_intent(&self.instrument.symbol, intent, &self.comment);
        request.volume = volume;

        info!(
            gateway = self.gateway.name(),
            symbol = %request.symbol,
            side = %request.side,
            volume = request.volume,
            take_profit = request.take_profit,
            relative = request.take_profit_is_relative,
            "placing order"
        );
        match self.gateway.place_order(&request) {
            Ok(confirmation) => {
                info!(
                    code = %confirmation.string_code,
                    order_id = ?confirmation.order_id,
                    position_id = ?confirmation.position_id,
                    "order placed"
                );
                Ok(confirmation)
            }
            Err(e) => {
                error!(side = %request.side, volume = request.volume, error = %e, "order failed");
                Err(e)
            }
        }
    }

    /// Apply every take-profit in `targets`, continuing past failures.
    pub fn apply_take_profits(&self, targets: &[TakeProfitRepair]) -> TakeProfitSummary {
        let mut summary = TakeProfitSummary::default();
        for target in targets {
            let take_profit = self.instrument.round_price(target.target);
            match self.gateway.modify_position(&target.position_id, take_profit) {
                Ok(_) => {
                    info!(
                        position_id = %target.position_id,
                        from = ?target.current,
                        to = take_profit,
                        "take-profit updated"
                    );
                    summary.applied += 1;
                }
                Err(e) => {
                    warn!(
                        position_id = %target.position_id,
                        take_profit,
                        error = %e,
                        "take-profit update failed"
                    );
                    summary.failed += 1;
                }
            }
        }
        summary
    }
}
