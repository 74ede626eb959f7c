//! Risk engine — position sizing, volatility stops, and trade validation.
//!
//! The risk engine reads portfolio state but never mutates it. Sizing risks
//! a fixed fraction of equity per trade against the stop distance, capped by
//! a maximum notional fraction of equity. Stops are placed at ATR multiples
//! from the entry (ATR here is the mean high-low range over the lookback
//! window, with a fixed-fraction fallback when history is short).

use crate::domain::{Bar, PortfolioLedger, PositionSide};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fallback stop distance as a fraction of entry price, used when fewer
/// than `volatility_lookback` bars of history are available.
const FALLBACK_ATR_FRACTION: f64 = 0.002;

/// Risk limits for one simulation run. Immutable once the engine is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Maximum position notional as a fraction of equity (0.1 = 10%).
    pub max_position_fraction: f64,
    /// Reject new entries after a one-bar equity drop beyond this fraction.
    pub max_daily_loss_fraction: f64,
    /// Equity fraction risked between entry and stop (0.01 = 1%).
    pub risk_per_trade_fraction: f64,
    /// Bars of history used for the ATR estimate.
    pub volatility_lookback: usize,
    /// Stop-loss distance in ATR multiples.
    pub stop_atr_multiple: f64,
    /// Take-profit distance in ATR multiples.
    pub take_profit_atr_multiple: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_position_fraction: 0.1,
            max_daily_loss_fraction: 0.02,
            risk_per_trade_fraction: 0.01,
            volatility_lookback: 20,
            stop_atr_multiple: 2.0,
            take_profit_atr_multiple: 3.0,
        }
    }
}

/// Volatility-derived protective levels for a prospective entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DynamicStops {
    pub stop_loss: f64,
    pub take_profit: f64,
    pub atr: f64,
}

/// Why a proposed trade was rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Proposed notional exceeds `max_position_fraction` of equity.
    OversizedPosition {
        notional_fraction: f64,
        max_fraction: f64,
    },
    /// A position is already open for the symbol (no pyramiding).
    AlreadyInPosition { symbol: String },
    /// The last one-bar equity return breached the daily loss limit.
    DailyLossExceeded { daily_return: f64, limit: f64 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::OversizedPosition {
                notional_fraction,
                max_fraction,
            } => write!(
                f,
                "position size {:.1}% exceeds max {:.1}%",
                notional_fraction * 100.0,
                max_fraction * 100.0
            ),
            RejectReason::AlreadyInPosition { symbol } => {
                write!(f, "already in position for {symbol}")
            }
            RejectReason::DailyLossExceeded {
                daily_return,
                limit,
            } => write!(
                f,
                "daily loss {:.1}% exceeds limit -{:.1}%",
                daily_return * 100.0,
                limit * 100.0
            ),
        }
    }
}

/// Outcome of `validate_trade`. Reasons accumulate; `is_valid` is false if
/// any check failed. `adjusted_size` carries the capped size when the only
/// problem was an oversized proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeValidation {
    pub is_valid: bool,
    pub reasons: Vec<RejectReason>,
    pub adjusted_size: f64,
}

/// Position sizing, stop placement, and pre-trade validation.
#[derive(Debug, Clone)]
pub struct RiskEngine {
    config: RiskConfig,
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Size a trade so that the entry-to-stop move loses
    /// `risk_per_trade_fraction` of equity, capped at
    /// `max_position_fraction` of equity by notional.
    ///
    /// A zero stop distance returns 0 ("do not trade"), never divides.
    pub fn position_size(&self, equity: f64, entry_price: f64, stop_loss: f64) -> f64 {
        let stop_distance = (entry_price - stop_loss).abs();
        if stop_distance == 0.0 || entry_price <= 0.0 {
            return 0.0;
        }

        let risk_amount = equity * self.config.risk_per_trade_fraction;
        let base_size = risk_amount / stop_distance;
        let max_size_by_fraction = equity * self.config.max_position_fraction / entry_price;

        base_size.min(max_size_by_fraction).max(0.0)
    }

    /// Volatility-based stop and target levels for a prospective entry.
    ///
    /// ATR is the mean high-low range over the last `volatility_lookback`
    /// bars of `recent_bars`; with insufficient history it degrades to a
    /// fixed fraction of the entry price rather than failing.
    pub fn dynamic_stops(
        &self,
        recent_bars: &[Bar],
        entry_price: f64,
        side: PositionSide,
    ) -> DynamicStops {
        let lookback = self.config.volatility_lookback;
        let atr = if recent_bars.len() >= lookback && lookback > 0 {
            let tail = &recent_bars[recent_bars.len() - lookback..];
            tail.iter().map(Bar::range).sum::<f64>() / lookback as f64
        } else {
            entry_price * FALLBACK_ATR_FRACTION
        };

        let sl_offset = self.config.stop_atr_multiple * atr;
        let tp_offset = self.config.take_profit_atr_multiple * atr;
        let (stop_loss, take_profit) = match side {
            PositionSide::Long => (entry_price - sl_offset, entry_price + tp_offset),
            PositionSide::Short => (entry_price + sl_offset, entry_price - tp_offset),
        };

        DynamicStops {
            stop_loss,
            take_profit,
            atr,
        }
    }

    /// Check a proposed trade against portfolio state.
    ///
    /// All checks run; rejection reasons accumulate. Reads the ledger only.
    pub fn validate_trade(
        &self,
        portfolio: &PortfolioLedger,
        symbol: &str,
        proposed_size: f64,
        price: f64,
    ) -> TradeValidation {
        let mut validation = TradeValidation {
            is_valid: true,
            reasons: Vec::new(),
            adjusted_size: proposed_size,
        };

        let equity = portfolio.total_equity();

        let notional = proposed_size * price;
        let max_notional = equity * self.config.max_position_fraction;
        if notional > max_notional {
            validation.is_valid = false;
            validation.reasons.push(RejectReason::OversizedPosition {
                notional_fraction: if equity > 0.0 { notional / equity } else { f64::INFINITY },
                max_fraction: self.config.max_position_fraction,
            });
            validation.adjusted_size = if price > 0.0 { max_notional / price } else { 0.0 };
        }

        if portfolio.has_position(symbol) {
            validation.is_valid = false;
            validation.reasons.push(RejectReason::AlreadyInPosition {
                symbol: symbol.to_string(),
            });
        }

        let history = portfolio.equity_history();
        if history.len() > 1 {
            let prev = history[history.len() - 2];
            if prev > 0.0 {
                let daily_return = history[history.len() - 1] / prev - 1.0;
                if daily_return < -self.config.max_daily_loss_fraction {
                    validation.is_valid = false;
                    validation.reasons.push(RejectReason::DailyLossExceeded {
                        daily_return,
                        limit: self.config.max_daily_loss_fraction,
                    });
                }
            }
        }

        validation
    }
}
