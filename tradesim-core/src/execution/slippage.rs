//! Slippage models — adverse-to-trader execution price adjustment.
//!
//! Slippage is the difference between the requested and executed price. The
//! parametric model combines a fixed base cost, size-proportional market
//! impact (capped), an absolute Gaussian volatility term, and half the
//! quoted spread. Buys execute above the reference price, sells below —
//! adverse by construction. All randomness flows through the injected RNG,
//! so a run is reproducible from its seed.

use crate::domain::{Order, OrderKind, OrderSide};
use crate::rng::normal_sample;
use rand::RngCore;

/// Executed prices are floored here so a large slippage draw can never
/// produce a non-positive price.
pub const MIN_EXECUTION_PRICE: f64 = 1e-5;

/// Size divisor for market impact: impact = size / 100_000, capped below.
const IMPACT_SIZE_DIVISOR: f64 = 100_000.0;

/// Market impact cap in price units.
const IMPACT_CAP: f64 = 0.001;

/// Standard deviation of the intra-bar move drawn by the latency-fill check.
const LATENCY_MOVE_STD: f64 = 1e-4;

/// Computes the executed price for an order against a reference price.
pub trait SlippageModel: Send + Sync {
    /// Executed price for `order` against `reference_price`. Implementations
    /// must be adverse-to-trader: >= reference for buys, <= for sells.
    fn apply(&self, order: &Order, reference_price: f64, rng: &mut dyn RngCore) -> f64;

    /// Model name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Frictionless fills at the reference price. Used by cash-conservation
/// tests and as a baseline execution preset.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSlippage;

impl SlippageModel for NoSlippage {
    fn apply(&self, _order: &Order, reference_price: f64, _rng: &mut dyn RngCore) -> f64 {
        reference_price.max(MIN_EXECUTION_PRICE)
    }

    fn name(&self) -> &'static str {
        "no_slippage"
    }
}

/// Base + impact + volatility noise + half-spread model.
#[derive(Debug, Clone, Copy)]
pub struct ParametricSlippage {
    /// Fixed slippage floor in price units (0.00005 = half a pip on FX).
    pub base_slippage: f64,
    /// Scales the Gaussian volatility noise; std dev = factor * 1e-4.
    pub volatility_factor: f64,
    /// Full quoted spread in price units; each fill pays half.
    pub spread_ratio: f64,
}

impl Default for ParametricSlippage {
    fn default() -> Self {
        Self {
            base_slippage: 0.00005,
            volatility_factor: 2.0,
            spread_ratio: 0.0001,
        }
    }
}

impl SlippageModel for ParametricSlippage {
    fn apply(&self, order: &Order, reference_price: f64, rng: &mut dyn RngCore) -> f64 {
        let size_impact = (order.size / IMPACT_SIZE_DIVISOR).min(IMPACT_CAP);
        let volatility_noise = normal_sample(rng, 0.0, self.volatility_factor * 1e-4).abs();
        let slippage = self.base_slippage + size_impact + volatility_noise;
        let spread_cost = self.spread_ratio / 2.0;

        let executed = match order.side {
            OrderSide::Buy => reference_price + slippage + spread_cost,
            OrderSide::Sell => reference_price - slippage - spread_cost,
        };
        executed.max(MIN_EXECUTION_PRICE)
    }

    fn name(&self) -> &'static str {
        "parametric"
    }
}

/// Outcome of the latency-fill simulation for a pending order.
#[derive(Debug, Clone, Copy)]
pub struct LatencyFill {
    pub can_fill: bool,
    pub potential_price: f64,
    pub latency_move: f64,
}

/// Simulate intra-bar price movement during order latency.
///
/// A limit buy fills only if the perturbed price is at or below the limit;
/// a limit sell only at or above. Market and stop orders always fill.
pub fn latency_fill_check(order: &Order, reference_price: f64, rng: &mut dyn RngCore) -> LatencyFill {
    let latency_move = normal_sample(rng, 0.0, LATENCY_MOVE_STD);
    let potential_price = reference_price + latency_move;

    let can_fill = match (order.kind, order.price) {
        (OrderKind::Limit, Some(limit)) => match order.side {
            OrderSide::Buy => potential_price <= limit,
            OrderSide::Sell => potential_price >= limit,
        },
        // A limit order without a price cannot be satisfied.
        (OrderKind::Limit, None) => false,
        _ => true,
    };

    LatencyFill {
        can_fill,
        potential_price,
        latency_move,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderId, OrderStatus};
    use crate::rng::SimRng;
    use chrono::{TimeZone, Utc};

    fn order(side: OrderSide, kind: OrderKind, size: f64, price: Option<f64>) -> Order {
        Order {
            id: OrderId(1),
            symbol: "EURUSD".into(),
            side,
            kind,
            size,
            price,
            stop_loss: None,
            take_profit: None,
            status: OrderStatus::Pending,
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn buys_execute_at_or_above_reference() {
        let model = ParametricSlippage::default();
        let mut rng = SimRng::new(42).rng_for("slip");
        let buy = order(OrderSide::Buy, OrderKind::Market, 1_000.0, None);
        for _ in 0..200 {
            assert!(model.apply(&buy, 1.2, &mut rng) >= 1.2);
        }
    }

    #[test]
    fn sells_execute_at_or_below_reference() {
        let model = ParametricSlippage::default();
        let mut rng = SimRng::new(42).rng_for("slip");
        let sell = order(OrderSide::Sell, OrderKind::Market, 1_000.0, None);
        for _ in 0..200 {
            assert!(model.apply(&sell, 1.2, &mut rng) <= 1.2);
        }
    }

    #[test]
    fn executed_price_is_floored_at_epsilon() {
        let model = ParametricSlippage::default();
        let mut rng = SimRng::new(42).rng_for("slip");
        let sell = order(OrderSide::Sell, OrderKind::Market, 1_000_000.0, None);
        // Reference near zero: slippage would push the price negative.
        let price = model.apply(&sell, 1e-6, &mut rng);
        assert!(price >= MIN_EXECUTION_PRICE);
    }

    #[test]
    fn market_impact_is_capped() {
        // Two huge orders differing only in size produce the same impact
        // term once past the cap; compare via a zero-noise seeded draw by
        // using the same rng state for both.
        let model = ParametricSlippage {
            volatility_factor: 0.0,
            ..ParametricSlippage::default()
        };
        let mut rng = SimRng::new(1).rng_for("slip");
        let big = order(OrderSide::Buy, OrderKind::Market, 200_000.0, None);
        let bigger = order(OrderSide::Buy, OrderKind::Market, 900_000.0, None);
        let a = model.apply(&big, 1.2, &mut rng);
        let b = model.apply(&bigger, 1.2, &mut rng);
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn no_slippage_fills_at_reference() {
        let model = NoSlippage;
        let mut rng = SimRng::new(1).rng_for("slip");
        let buy = order(OrderSide::Buy, OrderKind::Market, 1_000.0, None);
        assert_eq!(model.apply(&buy, 1.2345, &mut rng), 1.2345);
    }

    #[test]
    fn market_orders_always_pass_latency_check() {
        let mut rng = SimRng::new(42).rng_for("latency");
        let buy = order(OrderSide::Buy, OrderKind::Market, 1_000.0, None);
        for _ in 0..100 {
            assert!(latency_fill_check(&buy, 1.2, &mut rng).can_fill);
        }
    }

    #[test]
    fn limit_buy_fills_only_at_or_below_limit() {
        let mut rng = SimRng::new(42).rng_for("latency");
        // Limit far above the market: always fillable.
        let easy = order(OrderSide::Buy, OrderKind::Limit, 1_000.0, Some(2.0));
        assert!(latency_fill_check(&easy, 1.2, &mut rng).can_fill);
        // Limit far below the market: never fillable with a ~1e-4 move.
        let hard = order(OrderSide::Buy, OrderKind::Limit, 1_000.0, Some(1.0));
        assert!(!latency_fill_check(&hard, 1.2, &mut rng).can_fill);
    }

    #[test]
    fn limit_sell_fills_only_at_or_above_limit() {
        let mut rng = SimRng::new(42).rng_for("latency");
        let easy = order(OrderSide::Sell, OrderKind::Limit, 1_000.0, Some(1.0));
        assert!(latency_fill_check(&easy, 1.2, &mut rng).can_fill);
        let hard = order(OrderSide::Sell, OrderKind::Limit, 1_000.0, Some(2.0));
        assert!(!latency_fill_check(&hard, 1.2, &mut rng).can_fill);
    }
}
