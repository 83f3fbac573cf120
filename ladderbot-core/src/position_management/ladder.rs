//! Martingale ladder manager.
//!
//! A ladder is every open position on the traded symbol, oldest first. Each
//! time price moves against the ladder by a growing distance a new rung is
//! added with linearly growing volume, and all rungs share one take-profit at
//! the mean entry price plus a signed buffer.
//!
//! The first rung is opened with a far relative take-profit that acts as a
//! safety cap. It is only replaced by the shared exit once a second rung
//! exists.
//!
//! The manager only plans. Placing the rung and broadcasting the new
//! take-profit is the runner's job; both steps are idempotent from the
//! manager's point of view because the next cycle recomputes everything from
//! the broker's snapshot.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{Instrument, Position, PositionId, RoundingPolicy, Side, TradeIntent};
use crate::policy::LadderConfig;

/// Take-profit correction for one rung.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeProfitRepair {
    pub position_id: PositionId,
    pub current: Option<f64>,
    pub target: f64,
}

/// Plan for adding the next rung.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RungPlan {
    /// 1-based index of the rung being added.
    pub rung: usize,
    pub threshold: f64,
    pub price: f64,
    /// Order for the new rung; take-profit is the projected shared target.
    pub intent: TradeIntent,
    pub projected_take_profit: f64,
}

/// Why the ladder did not grow this cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldPlan {
    pub side: Side,
    pub rungs: usize,
    pub price: f64,
    pub threshold: f64,
    pub shared_take_profit: f64,
    /// Rungs whose broker take-profit drifted from the shared target.
    /// Always empty for a single-rung ladder.
    pub repairs: Vec<TakeProfitRepair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LadderDecision {
    /// No open positions: take the fresh-entry path.
    Empty,
    AddRung(RungPlan),
    Hold(HoldPlan),
}

#[derive(Debug, Clone)]
pub struct LadderManager {
    pub pip_step: f64,
    pub take_profit_buffer: f64,
    pub repair_tolerance: f64,
    pub instrument: Instrument,
}

impl LadderManager {
    pub fn new(config: &LadderConfig, instrument: Instrument) -> Self {
        Self {
            pip_step: config.pip_step,
            take_profit_buffer: config.take_profit_buffer,
            repair_tolerance: config.repair_tolerance,
            instrument,
        }
    }

    /// Direction of the ladder: the side of its most recent rung.
    ///
    /// A snapshot mixing long and short rungs is logged and resolved this way.
    pub fn ladder_side(&self, positions: &[Position]) -> Option<Side> {
        let latest = positions.last()?;
        if positions.iter().any(|p| p.side != latest.side) {
            warn!(
                rungs = positions.len(),
                side = %latest.side,
                "mixed-direction ladder, following the most recent rung"
            );
        }
        Some(latest.side)
    }

    /// Price the market must move beyond before the next rung is added.
    ///
    /// `last_entry ∓ pip_step × (n + 1)` where `n` is the current rung count.
    pub fn next_threshold(&self, positions: &[Position]) -> Option<f64> {
        let latest = positions.last()?;
        let distance = self.pip_step * (positions.len() + 1) as f64;
        Some(match latest.side {
            Side::Long => latest.entry_price - distance,
            Side::Short => latest.entry_price + distance,
        })
    }

    /// Volume of the next rung: first rung's volume × (n + 1).
    pub fn next_volume(&self, positions: &[Position]) -> Option<f64> {
        let first = positions.first()?;
        let raw = first.volume * (positions.len() + 1) as f64;
        Some(self.instrument.round_volume(raw, RoundingPolicy::Nearest))
    }

    fn buffer(&self, side: Side) -> f64 {
        side.sign() * self.take_profit_buffer
    }

    /// Shared exit after adding a rung at `threshold`.
    pub fn projected_take_profit(&self, positions: &[Position], side: Side, threshold: f64) -> f64 {
        let sum: f64 = positions.iter().map(|p| p.entry_price).sum::<f64>() + threshold;
        let mean = sum / (positions.len() + 1) as f64;
        self.instrument.round_price(mean + self.buffer(side))
    }

    /// Shared exit for the rungs as they stand.
    pub fn shared_take_profit(&self, positions: &[Position]) -> Option<f64> {
        let side = positions.last()?.side;
        let mean = positions.iter().map(|p| p.entry_price).sum::<f64>() / positions.len() as f64;
        Some(self.instrument.round_price(mean + self.buffer(side)))
    }

    /// Set every rung to the shared exit, whatever its current take-profit.
    pub fn broadcast_targets(&self, positions: &[Position]) -> Vec<TakeProfitRepair> {
        let Some(target) = self.shared_take_profit(positions) else {
            return Vec::new();
        };
        positions
            .iter()
            .map(|p| TakeProfitRepair {
                position_id: p.id.clone(),
                current: p.take_profit,
                target,
            })
            .collect()
    }

    /// Only the rungs whose take-profit is missing or off by more than the tolerance.
    ///
    /// A lone rung is never repaired: its take-profit is the entry's safety cap.
    pub fn drifted_targets(&self, positions: &[Position]) -> Vec<TakeProfitRepair> {
        if positions.len() < 2 {
            return Vec::new();
        }
        self.broadcast_targets(positions)
            .into_iter()
            .filter(|r| match r.current {
                Some(current) => (current - r.target).abs() > self.repair_tolerance,
                None => true,
            })
            .collect()
    }

    /// Decide whether the ladder grows this cycle.
    pub fn evaluate(&self, positions: &[Position]) -> LadderDecision {
        let (Some(side), Some(latest), Some(threshold), Some(volume)) = (
            self.ladder_side(positions),
            positions.last(),
            self.next_threshold(positions),
            self.next_volume(positions),
        ) else {
            return LadderDecision::Empty;
        };

        let price = latest.current_price;
        let crossed = match side {
            Side::Long => price < threshold,
            Side::Short => price > threshold,
        };

        if crossed {
            let projected_take_profit = self.projected_take_profit(positions, side, threshold);
            let rung = positions.len() + 1;
            info!(
                price,
                threshold,
                side = %side,
                rung,
                volume,
                take_profit = projected_take_profit,
                "ladder threshold crossed, adding rung"
            );
            return LadderDecision::AddRung(RungPlan {
                rung,
                threshold,
                price,
                intent: TradeIntent::absolute(side, volume, projected_take_profit),
                projected_take_profit,
            });
        }

        let shared_take_profit = self.shared_take_profit(positions).unwrap_or(threshold);
        let repairs = self.drifted_targets(positions);
        info!(
            price,
            threshold,
            side = %side,
            rungs = positions.len(),
            latest_move = latest.favourable_move(),
            repairs = repairs.len(),
            "ladder holding"
        );
        LadderDecision::Hold(HoldPlan {
            side,
            rungs: positions.len(),
            price,
            threshold,
            shared_take_profit,
            repairs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn manager() -> LadderManager {
        LadderManager::new(
            &LadderConfig::default(),
            Instrument::new("ETHUSDm", 0.01, 0.01, 2),
        )
    }

    fn rung(i: usize, side: Side, entry: f64, current: f64, volume: f64) -> Position {
        Position {
            id: PositionId::new(format!("p{i}")),
            symbol: "ETHUSDm".into(),
            side,
            entry_price: entry,
            current_price: current,
            volume,
            opened_at: Utc.with_ymd_and_hms(2025, 11, 15, 14, 0, 0).unwrap()
                + Duration::minutes(20 * i as i64),
            take_profit: None,
        }
    }

    #[test]
    fn empty_ladder() {
        assert_eq!(manager().evaluate(&[]), LadderDecision::Empty);
        assert_eq!(manager().next_threshold(&[]), None);
    }

    #[test]
    fn three_rung_long_ladder_adds_fourth() {
        let positions = vec![
            rung(0, Side::Long, 3030.0, 2955.0, 0.1),
            rung(1, Side::Long, 3010.0, 2955.0, 0.2),
            rung(2, Side::Long, 3000.0, 2955.0, 0.3),
        ];
        let m = manager();
        assert_eq!(m.next_threshold(&positions), Some(2960.0));
        match m.evaluate(&positions) {
            LadderDecision::AddRung(plan) => {
                assert_eq!(plan.rung, 4);
                assert_eq!(plan.threshold, 2960.0);
                assert_eq!(plan.intent.side, Side::Long);
                assert!((plan.intent.lot_size - 0.4).abs() < 1e-12);
                assert!(!plan.intent.take_profit_is_relative);
                // (3030 + 3010 + 3000 + 2960) / 4 + 2
                assert_eq!(plan.projected_take_profit, 3002.0);
            }
            other => panic!("expected AddRung, got {other:?}"),
        }
    }

    #[test]
    fn price_at_threshold_holds() {
        let positions = vec![rung(0, Side::Long, 3000.0, 2980.0, 0.1)];
        match manager().evaluate(&positions) {
            LadderDecision::Hold(hold) => {
                assert_eq!(hold.threshold, 2980.0);
                assert_eq!(hold.price, 2980.0);
                assert_eq!(hold.shared_take_profit, 3002.0);
            }
            other => panic!("expected Hold, got {other:?}"),
        }
    }

    #[test]
    fn short_ladder_mirrors() {
        let positions = vec![
            rung(0, Side::Short, 3000.0, 3031.0, 0.1),
            rung(1, Side::Short, 3010.0, 3031.0, 0.2),
        ];
        let m = manager();
        assert_eq!(m.next_threshold(&positions), Some(3040.0));
        assert!(matches!(m.evaluate(&positions), LadderDecision::Hold(_)));

        let positions: Vec<Position> = positions
            .into_iter()
            .map(|mut p| {
                p.current_price = 3041.0;
                p
            })
            .collect();
        match m.evaluate(&positions) {
            LadderDecision::AddRung(plan) => {
                assert_eq!(plan.intent.side, Side::Short);
                assert!((plan.intent.lot_size - 0.3).abs() < 1e-12);
                // (3000 + 3010 + 3040) / 3 - 2
                assert_eq!(plan.projected_take_profit, 3014.67);
            }
            other => panic!("expected AddRung, got {other:?}"),
        }
    }

    #[test]
    fn volume_scales_linearly_with_first_rung() {
        let m = manager();
        let mut positions = vec![rung(0, Side::Long, 3000.0, 2990.0, 0.05)];
        for n in 1..6 {
            assert!((m.next_volume(&positions).unwrap() - 0.05 * (n + 1) as f64).abs() < 1e-9);
            positions.push(rung(n, Side::Long, 3000.0, 2990.0, 0.5));
        }
    }

    #[test]
    fn broadcast_reaches_every_rung() {
        let positions = vec![
            rung(0, Side::Long, 3191.77, 3182.83, 0.1),
            rung(1, Side::Long, 3171.77, 3182.83, 0.2),
        ];
        let targets = manager().broadcast_targets(&positions);
        assert_eq!(targets.len(), 2);
        assert!(targets.iter().all(|t| t.target == 3183.77));
    }

    #[test]
    fn only_drifted_rungs_are_repaired() {
        let mut positions = vec![
            rung(0, Side::Long, 3000.0, 2995.0, 0.1),
            rung(1, Side::Long, 2980.0, 2995.0, 0.2),
        ];
        positions[0].take_profit = Some(2992.0);
        positions[1].take_profit = Some(3005.0);
        let repairs = manager().drifted_targets(&positions);
        assert_eq!(repairs.len(), 1);
        assert_eq!(repairs[0].position_id, PositionId::new("p1"));
        assert_eq!(repairs[0].target, 2992.0);
    }

    #[test]
    fn lone_rung_keeps_its_safety_take_profit() {
        let mut positions = vec![rung(0, Side::Long, 3000.0, 2995.0, 0.1)];
        positions[0].take_profit = Some(3100.0);
        let m = manager();
        assert!(m.drifted_targets(&positions).is_empty());
        match m.evaluate(&positions) {
            LadderDecision::Hold(hold) => {
                assert_eq!(hold.rungs, 1);
                assert!(hold.repairs.is_empty());
            }
            other => panic!("expected Hold, got {other:?}"),
        }

        positions[0].take_profit = None;
        assert!(m.drifted_targets(&positions).is_empty());
    }

    #[test]
    fn mixed_directions_follow_latest_rung() {
        let positions = vec![
            rung(0, Side::Long, 3000.0, 3050.0, 0.1),
            rung(1, Side::Short, 3000.0, 3050.0, 0.2),
        ];
        let m = manager();
        assert_eq!(m.ladder_side(&positions), Some(Side::Short));
        assert!(matches!(m.evaluate(&positions), LadderDecision::AddRung(ref p) if p.intent.side == Side::Short));
    }
}
