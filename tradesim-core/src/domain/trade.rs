//! TradeRecord — immutable, append-only ledger entries for trade lifecycle events.

use super::position::PositionSide;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    StopLoss,
    TakeProfit,
    /// An opposite-direction entry signal closed the position before
    /// opening the new one.
    SignalReversal,
    Manual,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::StopLoss => write!(f, "STOP_LOSS"),
            CloseReason::TakeProfit => write!(f, "TAKE_PROFIT"),
            CloseReason::SignalReversal => write!(f, "SIGNAL_REVERSAL"),
            CloseReason::Manual => write!(f, "MANUAL"),
        }
    }
}

/// One entry in the trade history.
///
/// Open and close are separate events, appended in order; a round trip
/// produces two records. Records are never mutated after being appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum TradeRecord {
    #[serde(rename = "OPEN")]
    Open {
        symbol: String,
        side: PositionSide,
        price: f64,
        size: f64,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "CLOSE")]
    Close {
        symbol: String,
        side: PositionSide,
        entry_price: f64,
        exit_price: f64,
        size: f64,
        pnl: f64,
        reason: CloseReason,
        timestamp: DateTime<Utc>,
    },
}

impl TradeRecord {
    pub fn symbol(&self) -> &str {
        match self {
            TradeRecord::Open { symbol, .. } | TradeRecord::Close { symbol, .. } => symbol,
        }
    }

    pub fn is_close(&self) -> bool {
        matches!(self, TradeRecord::Close { .. })
    }

    /// Realized PnL for close records, `None` for opens.
    pub fn pnl(&self) -> Option<f64> {
        match self {
            TradeRecord::Close { pnl, .. } => Some(*pnl),
            TradeRecord::Open { .. } => None,
        }
    }
}
