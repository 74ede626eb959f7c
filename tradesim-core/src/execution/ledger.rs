//! Order ledger — order storage, lifecycle transitions, and fills.
//!
//! The ledger owns every order from creation until a terminal state and is
//! the only code allowed to transition an order's status. Transitions are
//! one-directional (Pending → Filled / Cancelled / Rejected); any attempt to
//! act on a terminal order surfaces a typed error instead of mutating it.
//! Fill pricing is delegated to the slippage model.

use super::slippage::{latency_fill_check, SlippageModel};
use crate::domain::{IdGen, Order, OrderId, OrderKind, OrderSide, OrderStatus};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors from order ledger operations.
#[derive(Debug, Error)]
pub enum OrderLedgerError {
    #[error("order {0} not found")]
    UnknownOrder(OrderId),

    #[error("order {id} already processed (status: {status})")]
    AlreadyProcessed { id: OrderId, status: OrderStatus },

    #[error("invalid order size {size}")]
    InvalidSize { size: f64 },
}

/// Record of a completed fill, handed to the portfolio ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillResult {
    pub order_id: OrderId,
    pub symbol: String,
    pub side: OrderSide,
    pub size: f64,
    pub requested_price: f64,
    pub executed_price: f64,
    /// `executed_price - requested_price`; positive for buys, negative for
    /// sells under an adverse slippage model.
    pub slippage: f64,
    pub timestamp: DateTime<Utc>,
}

/// Tracks pending, filled, and cancelled orders for one simulation run.
pub struct OrderLedger {
    orders: HashMap<OrderId, Order>,
    fills: Vec<FillResult>,
    id_gen: IdGen,
    slippage: Box<dyn SlippageModel>,
}

impl OrderLedger {
    pub fn new(slippage: Box<dyn SlippageModel>) -> Self {
        Self {
            orders: HashMap::new(),
            fills: Vec::new(),
            id_gen: IdGen::default(),
            slippage,
        }
    }

    /// Create a new order in state Pending.
    ///
    /// Non-positive or non-finite sizes are malformed input and rejected
    /// with a typed error rather than producing silently-wrong fills.
    #[allow(clippy::too_many_arguments)]
    pub fn create_order(
        &mut self,
        symbol: &str,
        side: OrderSide,
        kind: OrderKind,
        size: f64,
        price: Option<f64>,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
        created_at: DateTime<Utc>,
    ) -> Result<OrderId, OrderLedgerError> {
        if !(size.is_finite() && size > 0.0) {
            return Err(OrderLedgerError::InvalidSize { size });
        }

        let id = self.id_gen.next_order_id();
        let order = Order {
            id,
            symbol: symbol.to_string(),
            side,
            kind,
            size,
            price,
            stop_loss,
            take_profit,
            status: OrderStatus::Pending,
            created_at,
        };
        self.orders.insert(id, order);
        Ok(id)
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    /// Execute a pending order against a reference price.
    ///
    /// Market and stop orders always fill. Limit orders run the latency-fill
    /// check first; when the perturbed price does not satisfy the limit the
    /// order stays Pending and `Ok(None)` is returned. A terminal order is a
    /// caller bug and fails with `AlreadyProcessed`.
    pub fn execute_order(
        &mut self,
        id: OrderId,
        reference_price: f64,
        time: DateTime<Utc>,
        rng: &mut dyn RngCore,
    ) -> Result<Option<FillResult>, OrderLedgerError> {
        let order = self
            .orders
            .get_mut(&id)
            .ok_or(OrderLedgerError::UnknownOrder(id))?;

        if order.status.is_terminal() {
            return Err(OrderLedgerError::AlreadyProcessed {
                id,
                status: order.status,
            });
        }

        if order.kind == OrderKind::Limit {
            let latency = latency_fill_check(order, reference_price, rng);
            if !latency.can_fill {
                return Ok(None);
            }
        }

        let executed_price = self.slippage.apply(order, reference_price, rng);
        order.status = OrderStatus::Filled;
        order.price = Some(executed_price);

        let fill = FillResult {
            order_id: id,
            symbol: order.symbol.clone(),
            side: order.side,
            size: order.size,
            requested_price: reference_price,
            executed_price,
            slippage: executed_price - reference_price,
            timestamp: time,
        };
        self.fills.push(fill.clone());
        Ok(Some(fill))
    }

    /// Cancel a pending order. Returns false (no-op) for any other status.
    pub fn cancel_order(&mut self, id: OrderId) -> bool {
        match self.orders.get_mut(&id) {
            Some(order) if order.is_pending() => {
                order.status = OrderStatus::Cancelled;
                true
            }
            _ => false,
        }
    }

    pub fn pending_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values().filter(|o| o.is_pending())
    }

    pub fn has_pending_orders(&self) -> bool {
        self.orders.values().any(|o| o.is_pending())
    }

    pub fn fills(&self) -> &[FillResult] {
        &self.fills
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::slippage::{NoSlippage, ParametricSlippage};
    use crate::rng::SimRng;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap()
    }

    fn market_ledger() -> OrderLedger {
        OrderLedger::new(Box::new(NoSlippage))
    }

    #[test]
    fn create_order_starts_pending() {
        let mut ledger = market_ledger();
        let id = ledger
            .create_order("EURUSD", OrderSide::Buy, OrderKind::Market, 100.0, None, None, None, t0())
            .unwrap();
        assert!(ledger.order(id).unwrap().is_pending());
        assert!(ledger.has_pending_orders());
    }

    #[test]
    fn non_positive_size_is_rejected() {
        let mut ledger = market_ledger();
        for bad in [0.0, -5.0, f64::NAN] {
            let err = ledger
                .create_order("EURUSD", OrderSide::Buy, OrderKind::Market, bad, None, None, None, t0())
                .unwrap_err();
            assert!(matches!(err, OrderLedgerError::InvalidSize { .. }));
        }
    }

    #[test]
    fn market_order_fills_and_leaves_pending_set() {
        let mut ledger = market_ledger();
        let mut rng = SimRng::new(42).rng_for("EURUSD");
        let id = ledger
            .create_order("EURUSD", OrderSide::Buy, OrderKind::Market, 100.0, None, None, None, t0())
            .unwrap();
        let fill = ledger.execute_order(id, 1.2, t0(), &mut rng).unwrap().unwrap();
        assert_eq!(fill.executed_price, 1.2);
        assert_eq!(fill.slippage, 0.0);
        assert_eq!(ledger.order(id).unwrap().status, OrderStatus::Filled);
        assert!(!ledger.has_pending_orders());
        assert_eq!(ledger.fills().len(), 1);
    }

    #[test]
    fn executing_a_filled_order_fails() {
        let mut ledger = market_ledger();
        let mut rng = SimRng::new(42).rng_for("EURUSD");
        let id = ledger
            .create_order("EURUSD", OrderSide::Buy, OrderKind::Market, 100.0, None, None, None, t0())
            .unwrap();
        ledger.execute_order(id, 1.2, t0(), &mut rng).unwrap();
        let err = ledger.execute_order(id, 1.2, t0(), &mut rng).unwrap_err();
        assert!(matches!(err, OrderLedgerError::AlreadyProcessed { .. }));
    }

    #[test]
    fn executing_unknown_order_fails() {
        let mut ledger = market_ledger();
        let mut rng = SimRng::new(42).rng_for("EURUSD");
        let err = ledger.execute_order(OrderId(99), 1.2, t0(), &mut rng).unwrap_err();
        assert!(matches!(err, OrderLedgerError::UnknownOrder(_)));
    }

    #[test]
    fn cancel_is_noop_after_terminal_state() {
        let mut ledger = market_ledger();
        let mut rng = SimRng::new(42).rng_for("EURUSD");
        let id = ledger
            .create_order("EURUSD", OrderSide::Buy, OrderKind::Market, 100.0, None, None, None, t0())
            .unwrap();
        assert!(ledger.cancel_order(id));
        assert_eq!(ledger.order(id).unwrap().status, OrderStatus::Cancelled);
        // Cancelled is terminal: neither cancel nor execute may touch it.
        assert!(!ledger.cancel_order(id));
        assert!(ledger.execute_order(id, 1.2, t0(), &mut rng).is_err());
    }

    #[test]
    fn unfillable_limit_order_stays_pending() {
        let mut ledger = market_ledger();
        let mut rng = SimRng::new(42).rng_for("EURUSD");
        // Limit buy far below the market cannot fill on a ~1e-4 move.
        let id = ledger
            .create_order("EURUSD", OrderSide::Buy, OrderKind::Limit, 100.0, Some(1.0), None, None, t0())
            .unwrap();
        let result = ledger.execute_order(id, 1.2, t0(), &mut rng).unwrap();
        assert!(result.is_none());
        assert!(ledger.order(id).unwrap().is_pending());
    }

    #[test]
    fn fillable_limit_order_fills() {
        let mut ledger = market_ledger();
        let mut rng = SimRng::new(42).rng_for("EURUSD");
        let id = ledger
            .create_order("EURUSD", OrderSide::Buy, OrderKind::Limit, 100.0, Some(2.0), None, None, t0())
            .unwrap();
        assert!(ledger.execute_order(id, 1.2, t0(), &mut rng).unwrap().is_some());
    }

    #[test]
    fn slippage_is_recorded_relative_to_reference() {
        let mut ledger = OrderLedger::new(Box::new(ParametricSlippage::default()));
        let mut rng = SimRng::new(42).rng_for("EURUSD");
        let id = ledger
            .create_order("EURUSD", OrderSide::Sell, OrderKind::Market, 100.0, None, None, None, t0())
            .unwrap();
        let fill = ledger.execute_order(id, 1.2, t0(), &mut rng).unwrap().unwrap();
        assert!(fill.slippage <= 0.0);
        assert!((fill.executed_price - (1.2 + fill.slippage)).abs() < 1e-12);
    }
}
