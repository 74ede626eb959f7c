//! Trade sink — the persistence boundary.
//!
//! Open and close events are forwarded to an external logging collaborator
//! (CSV/SQLite analytics, broker journals) at the appropriate lifecycle
//! points. The core never implements storage; `NoopSink` is the default so
//! nothing branches on sink presence.

use crate::domain::{OrderId, OrderSide};

/// Receives trade lifecycle events. Implementations live outside the core.
pub trait TradeSink: Send {
    #[allow(clippy::too_many_arguments)]
    fn log_open(
        &mut self,
        symbol: &str,
        side: OrderSide,
        order_ref: OrderId,
        volume: f64,
        entry_price: f64,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
        strategy_label: &str,
    );

    fn log_close(
        &mut self,
        order_ref: Option<OrderId>,
        exit_price: f64,
        profit: f64,
        commission: f64,
        swap: f64,
    );
}

/// Default sink: drops every event.
#[derive(Debug, Default)]
pub struct NoopSink;

impl TradeSink for NoopSink {
    fn log_open(
        &mut self,
        _symbol: &str,
        _side: OrderSide,
        _order_ref: OrderId,
        _volume: f64,
        _entry_price: f64,
        _stop_loss: Option<f64>,
        _take_profit: Option<f64>,
        _strategy_label: &str,
    ) {
    }

    fn log_close(
        &mut self,
        _order_ref: Option<OrderId>,
        _exit_price: f64,
        _profit: f64,
        _commission: f64,
        _swap: f64,
    ) {
    }
}
