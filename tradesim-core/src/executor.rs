//! Trade executor — turns a signal into a risk-checked, filled position.
//!
//! The executor owns the trade decision: it asks the risk engine for stops
//! and size, validates against portfolio state, routes a market order
//! through the order ledger, and opens the position on a successful fill.
//! Every failure along the way is non-fatal — the signal is skipped, a
//! rejection is recorded, and the engine proceeds to the next bar.

use crate::domain::{
    Bar, CloseReason, OrderId, OrderKind, OrderSide, PortfolioLedger, PositionSide, TradeRecord,
};
use crate::execution::{FillResult, OrderLedger};
use crate::risk::{RejectReason, RiskEngine};
use crate::sink::{NoopSink, TradeSink};
use crate::strategy::Signal;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A signal the executor declined to trade, with the validator's reasons.
/// Collected into the run result instead of being logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedSignal {
    pub bar_index: usize,
    pub symbol: String,
    pub signal: Signal,
    pub reasons: Vec<RejectReason>,
}

/// Orchestrates risk engine → order ledger → portfolio ledger for a signal.
pub struct TradeExecutor {
    risk: RiskEngine,
    orders: OrderLedger,
    sink: Box<dyn TradeSink>,
    strategy_label: String,
    /// Entry order per open symbol, forwarded to the sink on close.
    entry_orders: HashMap<String, OrderId>,
    rejections: Vec<RejectedSignal>,
}

impl TradeExecutor {
    pub fn new(risk: RiskEngine, orders: OrderLedger, strategy_label: impl Into<String>) -> Self {
        Self::with_sink(risk, orders, strategy_label, Box::new(NoopSink))
    }

    pub fn with_sink(
        risk: RiskEngine,
        orders: OrderLedger,
        strategy_label: impl Into<String>,
        sink: Box<dyn TradeSink>,
    ) -> Self {
        Self {
            risk,
            orders,
            sink,
            strategy_label: strategy_label.into(),
            entry_orders: HashMap::new(),
            rejections: Vec::new(),
        }
    }

    /// Act on an entry signal for the bar's symbol.
    ///
    /// An opposite-side open position is reversed (closed at the bar close)
    /// before the new entry is evaluated. Returns the fill on success,
    /// `None` when the signal was skipped for any reason.
    pub fn execute_signal(
        &mut self,
        portfolio: &mut PortfolioLedger,
        signal: Signal,
        window: &[Bar],
        bar: &Bar,
        bar_index: usize,
        rng: &mut dyn RngCore,
    ) -> Option<FillResult> {
        let side = match signal {
            Signal::Buy => OrderSide::Buy,
            Signal::Sell => OrderSide::Sell,
            Signal::None => return None,
        };
        let entry_side = PositionSide::from(side);
        let price = bar.close;

        if let Some(position) = portfolio.position(&bar.symbol) {
            if position.side != entry_side {
                self.close_with_sink(portfolio, bar, price, CloseReason::SignalReversal);
            }
        }

        let stops = self.risk.dynamic_stops(window, price, entry_side);
        let proposed = self
            .risk
            .position_size(portfolio.total_equity(), price, stops.stop_loss);
        if proposed <= 0.0 {
            return None;
        }

        let validation = self.risk.validate_trade(portfolio, &bar.symbol, proposed, price);
        let size = if validation.is_valid {
            proposed
        } else {
            // An oversized proposal alone is recoverable: substitute the
            // capped size. Any other reason rejects the signal outright.
            let only_oversized = validation
                .reasons
                .iter()
                .all(|r| matches!(r, RejectReason::OversizedPosition { .. }));
            if only_oversized && validation.adjusted_size > 0.0 {
                validation.adjusted_size
            } else {
                self.rejections.push(RejectedSignal {
                    bar_index,
                    symbol: bar.symbol.clone(),
                    signal,
                    reasons: validation.reasons,
                });
                return None;
            }
        };

        let order_id = self
            .orders
            .create_order(
                &bar.symbol,
                side,
                OrderKind::Market,
                size,
                None,
                Some(stops.stop_loss),
                Some(stops.take_profit),
                bar.timestamp,
            )
            .ok()?;

        let fill = self
            .orders
            .execute_order(order_id, price, bar.timestamp, rng)
            .ok()??;

        if portfolio
            .open_position(
                &bar.symbol,
                entry_side,
                fill.executed_price,
                size,
                Some(stops.stop_loss),
                Some(stops.take_profit),
                bar.timestamp,
            )
            .is_err()
        {
            self.rejections.push(RejectedSignal {
                bar_index,
                symbol: bar.symbol.clone(),
                signal,
                reasons: vec![RejectReason::AlreadyInPosition {
                    symbol: bar.symbol.clone(),
                }],
            });
            return None;
        }

        self.entry_orders.insert(bar.symbol.clone(), fill.order_id);
        self.sink.log_open(
            &bar.symbol,
            side,
            fill.order_id,
            size,
            fill.executed_price,
            Some(stops.stop_loss),
            Some(stops.take_profit),
            &self.strategy_label,
        );

        Some(fill)
    }

    /// Evaluate stop-loss / take-profit levels against the bar's range.
    ///
    /// Stop-loss is checked before take-profit — when a bar spans both
    /// levels the adverse exit wins (conservative tie-break). The exit
    /// executes at the protective level itself.
    pub fn check_protective_exits(
        &mut self,
        portfolio: &mut PortfolioLedger,
        bar: &Bar,
    ) -> Option<TradeRecord> {
        let position = portfolio.position(&bar.symbol)?;

        let exit = match position.side {
            PositionSide::Long => {
                if position.stop_loss.is_some_and(|sl| bar.low <= sl) {
                    Some((position.stop_loss.unwrap(), CloseReason::StopLoss))
                } else if position.take_profit.is_some_and(|tp| bar.high >= tp) {
                    Some((position.take_profit.unwrap(), CloseReason::TakeProfit))
                } else {
                    None
                }
            }
            PositionSide::Short => {
                if position.stop_loss.is_some_and(|sl| bar.high >= sl) {
                    Some((position.stop_loss.unwrap(), CloseReason::StopLoss))
                } else if position.take_profit.is_some_and(|tp| bar.low <= tp) {
                    Some((position.take_profit.unwrap(), CloseReason::TakeProfit))
                } else {
                    None
                }
            }
        };

        let (exit_price, reason) = exit?;
        self.close_with_sink(portfolio, bar, exit_price, reason)
    }

    fn close_with_sink(
        &mut self,
        portfolio: &mut PortfolioLedger,
        bar: &Bar,
        exit_price: f64,
        reason: CloseReason,
    ) -> Option<TradeRecord> {
        let record = portfolio.close_position(&bar.symbol, exit_price, reason, bar.timestamp)?;
        let order_ref = self.entry_orders.remove(&bar.symbol);
        self.sink.log_close(
            order_ref,
            exit_price,
            record.pnl().unwrap_or(0.0),
            0.0,
            0.0,
        );
        Some(record)
    }

    pub fn rejections(&self) -> &[RejectedSignal] {
        &self.rejections
    }

    pub fn order_ledger(&self) -> &OrderLedger {
        &self.orders
    }
}
