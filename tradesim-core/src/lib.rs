//! TradeSim Core — strategy backtest simulation engine.
//!
//! The crate simulates order execution, position accounting, and
//! risk-constrained sizing over historical bar series, producing an equity
//! curve and trade ledger for downstream analysis:
//! - Domain types (bars, orders, positions, portfolio ledger, trade records)
//! - Risk engine (fixed-fraction sizing, ATR stops, pre-trade validation)
//! - Order ledger with one-directional lifecycle and slippage models
//! - Trade executor (signal → risk → order → position)
//! - Bar-by-bar engine with warmup, protective exits, and mark-to-market
//!
//! Indicators, data loading, reporting, and persistence are external
//! collaborators behind the `Strategy` and `TradeSink` traits.

pub mod domain;
pub mod engine;
pub mod execution;
pub mod executor;
pub mod risk;
pub mod rng;
pub mod sink;
pub mod strategy;
