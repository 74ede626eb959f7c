//! PortfolioLedger — cash, open positions, equity history, trade history.
//!
//! The ledger is the only mutable state in a simulation run and has exactly
//! one writer per bar (the trade executor, then the engine's mark-to-market
//! call). Cash changes only through `open_position` (debit of the entry
//! notional) and `close_position` (credit of entry notional plus realized
//! PnL); equity history is append-only with one sample per processed bar.

use super::position::{Position, PositionSide};
use super::trade::{CloseReason, TradeRecord};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

/// Errors from ledger operations.
#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("position already open for {0}")]
    DuplicatePosition(String),
}

/// Aggregate portfolio state for one simulation run.
#[derive(Debug, Clone)]
pub struct PortfolioLedger {
    initial_balance: f64,
    cash: f64,
    positions: HashMap<String, Position>,
    equity_history: Vec<f64>,
    trade_history: Vec<TradeRecord>,
}

impl PortfolioLedger {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            initial_balance,
            cash: initial_balance,
            positions: HashMap::new(),
            equity_history: Vec::new(),
            trade_history: Vec::new(),
        }
    }

    /// Open a new position, debiting cash by the entry notional.
    ///
    /// Fails with `DuplicatePosition` if a position already exists for the
    /// symbol — this core does not pyramid or net; the risk engine rejects
    /// such trades before they reach the ledger.
    pub fn open_position(
        &mut self,
        symbol: &str,
        side: PositionSide,
        price: f64,
        size: f64,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
        entry_time: DateTime<Utc>,
    ) -> Result<&Position, PortfolioError> {
        if self.positions.contains_key(symbol) {
            return Err(PortfolioError::DuplicatePosition(symbol.to_string()));
        }

        self.cash -= price * size;
        self.trade_history.push(TradeRecord::Open {
            symbol: symbol.to_string(),
            side,
            price,
            size,
            timestamp: entry_time,
        });

        let position = Position {
            symbol: symbol.to_string(),
            side,
            entry_price: price,
            size,
            entry_time,
            stop_loss,
            take_profit,
        };
        Ok(self.positions.entry(symbol.to_string()).or_insert(position))
    }

    /// Close the position for `symbol`, crediting cash with the entry
    /// notional plus realized PnL.
    ///
    /// Returns `None` when no position exists — an idempotent no-op, not an
    /// error. Callers (protective exits, reversals) rely on this.
    pub fn close_position(
        &mut self,
        symbol: &str,
        exit_price: f64,
        reason: CloseReason,
        exit_time: DateTime<Utc>,
    ) -> Option<TradeRecord> {
        let position = self.positions.remove(symbol)?;
        let pnl = position.realized_pnl(exit_price);

        self.cash += position.notional() + pnl;

        let record = TradeRecord::Close {
            symbol: symbol.to_string(),
            side: position.side,
            entry_price: position.entry_price,
            exit_price,
            size: position.size,
            pnl,
            reason,
            timestamp: exit_time,
        };
        self.trade_history.push(record.clone());
        Some(record)
    }

    /// Mark all open positions to market and append the equity sample.
    ///
    /// Equity is cash plus unrealized PnL over open positions; a symbol
    /// missing from `current_prices` is marked at its entry price. Must be
    /// called exactly once per bar, after any same-bar opens/closes, so the
    /// equity history stays aligned 1:1 with the bar sequence.
    pub fn update_equity(&mut self, current_prices: &HashMap<String, f64>) -> f64 {
        let unrealized: f64 = self
            .positions
            .values()
            .map(|pos| {
                let price = current_prices
                    .get(&pos.symbol)
                    .copied()
                    .unwrap_or(pos.entry_price);
                pos.unrealized_pnl(price)
            })
            .sum();

        let equity = self.cash + unrealized;
        self.equity_history.push(equity);
        equity
    }

    /// Latest equity sample, or the initial balance before any bar has
    /// been processed.
    pub fn total_equity(&self) -> f64 {
        self.equity_history
            .last()
            .copied()
            .unwrap_or(self.initial_balance)
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn open_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    pub fn equity_history(&self) -> &[f64] {
        &self.equity_history
    }

    pub fn trade_history(&self) -> &[TradeRecord] {
        &self.trade_history
    }
}
