//! Engine configuration, phase machine, and run result types.

use crate::domain::TradeRecord;
use crate::execution::{FillResult, NoSlippage, ParametricSlippage, SlippageModel};
use crate::executor::RejectedSignal;
use crate::risk::RiskConfig;
use crate::strategy::Signal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal input errors. Everything else in the simulation is non-fatal; a
/// run over valid input always completes.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("non-monotonic timestamps at bar {index}")]
    NonMonotonicTimestamps { index: usize },

    #[error("malformed OHLCV data at bar {index}")]
    MalformedBar { index: usize },

    #[error("bar {index} has symbol {found}, expected {expected}")]
    SymbolMismatch {
        index: usize,
        found: String,
        expected: String,
    },
}

/// Which slippage model the order ledger is built with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum SlippageConfig {
    /// Fills at the reference price. Baseline and invariant tests.
    Frictionless,
    /// Base + impact + volatility noise + half-spread.
    Parametric {
        base_slippage: f64,
        volatility_factor: f64,
        spread_ratio: f64,
    },
}

impl SlippageConfig {
    pub fn build(&self) -> Box<dyn SlippageModel> {
        match *self {
            SlippageConfig::Frictionless => Box::new(NoSlippage),
            SlippageConfig::Parametric {
                base_slippage,
                volatility_factor,
                spread_ratio,
            } => Box::new(ParametricSlippage {
                base_slippage,
                volatility_factor,
                spread_ratio,
            }),
        }
    }
}

impl Default for SlippageConfig {
    fn default() -> Self {
        let ParametricSlippage {
            base_slippage,
            volatility_factor,
            spread_ratio,
        } = ParametricSlippage::default();
        SlippageConfig::Parametric {
            base_slippage,
            volatility_factor,
            spread_ratio,
        }
    }
}

/// Configuration for a single simulation run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub symbol: String,
    pub initial_balance: f64,
    /// Bars collected before any trading; also the strategy window length.
    pub warmup_bars: usize,
    pub risk: RiskConfig,
    pub slippage: SlippageConfig,
    /// Master seed for the slippage RNG; (bars, config, seed) fully
    /// determine a run.
    pub seed: u64,
}

impl EngineConfig {
    pub fn new(symbol: impl Into<String>, initial_balance: f64) -> Self {
        let risk = RiskConfig::default();
        Self {
            symbol: symbol.into(),
            initial_balance,
            warmup_bars: risk.volatility_lookback,
            risk,
            slippage: SlippageConfig::default(),
            seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn frictionless(mut self) -> Self {
        self.slippage = SlippageConfig::Frictionless;
        self
    }
}

/// Engine phases. Warmup collects the initial lookback window with no
/// trading; Running processes signals; Done means input was exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Warmup,
    Running,
    Done,
}

/// Everything a run produces, handed to external reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Equity at each bar close, one entry per processed bar.
    pub equity_curve: Vec<f64>,
    /// Signal emitted at each bar (NONE during warmup).
    pub signals: Vec<Signal>,
    /// Open and close events in order.
    pub trades: Vec<TradeRecord>,
    /// All fills generated during the run.
    pub fills: Vec<FillResult>,
    /// Signals the executor declined, with reasons.
    pub rejections: Vec<RejectedSignal>,
    pub final_equity: f64,
    pub bar_count: usize,
    pub warmup_bars: usize,
}

impl RunResult {
    /// Net PnL over the run.
    pub fn net_pnl(&self, initial_balance: f64) -> f64 {
        self.final_equity - initial_balance
    }

    /// Completed round trips (close records only).
    pub fn closed_trades(&self) -> impl Iterator<Item = &TradeRecord> {
        self.trades.iter().filter(|t| t.is_close())
    }
}
