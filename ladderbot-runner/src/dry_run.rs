//! Dry-run gateway — logs and records orders instead of sending them.

use std::sync::{Mutex, MutexGuard};

use tracing::info;

use ladderbot_core::data::{BrokerError, BrokerGateway, OrderConfirmation, OrderRequest};
use ladderbot_core::domain::PositionId;

#[derive(Debug, Default)]
struct Recorded {
    orders: Vec<OrderRequest>,
    modifications: Vec<(PositionId, f64)>,
}

#[derive(Debug, Default)]
pub struct DryRunGateway {
    recorded: Mutex<Recorded>,
}

impl DryRunGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders seen so far, in call order.
    pub fn orders(&self) -> Vec<OrderRequest> {
        self.recorded().orders.clone()
    }

    pub fn modifications(&self) -> Vec<(PositionId, f64)> {
        self.recorded().modifications.clone()
    }

    fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn confirmation(message: String) -> OrderConfirmation {
    OrderConfirmation {
        numeric_code: 0,
        string_code: "DRY_RUN".into(),
        message,
        order_id: None,
        position_id: None,
    }
}

impl BrokerGateway for DryRunGateway {
    fn name(&self) -> &str {
        "dry-run"
    }

    fn place_order(&self, request: &OrderRequest) -> Result<OrderConfirmation, BrokerError> {
        info!(
            symbol = %request.symbol,
            side = %request.side,
            volume = request.volume,
            take_profit = request.take_profit,
            relative = request.take_profit_is_relative,
            "dry run: order not sent"
        );
        self.recorded().orders.push(request.clone());
        Ok(confirmation(format!("would {} {} {}", request.side, request.volume, request.symbol)))
    }

    fn modify_position(
        &self,
        position_id: &PositionId,
        take_profit: f64,
    ) -> Result<OrderConfirmation, BrokerError> {
        info!(position_id = %position_id, take_profit, "dry run: modification not sent");
        self.recorded().modifications.push((position_id.clone(), take_profit));
        Ok(confirmation(format!("would set take-profit {take_profit}")))
    }
}
