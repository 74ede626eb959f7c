//! Simulation engine — warmup/running/done phase machine and the bar loop.
//!
//! Per running bar:
//! 1. Protective exits: stop-loss / take-profit against the bar's range
//! 2. Signal: strategy sees the trailing window, executor acts on Buy/Sell
//! 3. Mark-to-market: exactly one equity sample per bar

pub mod runner;
pub mod state;

pub use runner::SimulationEngine;
pub use state::{EngineConfig, EngineError, EnginePhase, RunResult, SlippageConfig};
