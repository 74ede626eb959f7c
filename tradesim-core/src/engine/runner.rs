//! Bar-by-bar simulation loop.
//!
//! Per running bar: protective exits on open positions, then the strategy
//! signal (delegated to the executor), then exactly one mark-to-market call
//! so the equity history stays aligned 1:1 with the bar sequence. The loop
//! is a deterministic fold — no I/O, no wall-clock dependence, the only
//! randomness is the seeded slippage stream.

use super::state::{EngineConfig, EngineError, EnginePhase, RunResult};
use crate::domain::{Bar, PortfolioLedger};
use crate::execution::OrderLedger;
use crate::executor::TradeExecutor;
use crate::risk::RiskEngine;
use crate::rng::SimRng;
use crate::sink::TradeSink;
use crate::strategy::{Signal, Strategy};
use std::collections::HashMap;

/// Drives one simulation run over an ordered bar series.
pub struct SimulationEngine {
    config: EngineConfig,
    phase: EnginePhase,
}

impl SimulationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            phase: EnginePhase::Warmup,
        }
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the simulation with the default (no-op) trade sink.
    pub fn run(
        &mut self,
        bars: &[Bar],
        strategy: &mut dyn Strategy,
    ) -> Result<RunResult, EngineError> {
        let risk = RiskEngine::new(self.config.risk.clone());
        let orders = OrderLedger::new(self.config.slippage.build());
        let executor = TradeExecutor::new(risk, orders, strategy.name());
        self.run_with_executor(bars, strategy, executor)
    }

    /// Run the simulation, forwarding trade lifecycle events to `sink`.
    pub fn run_with_sink(
        &mut self,
        bars: &[Bar],
        strategy: &mut dyn Strategy,
        sink: Box<dyn TradeSink>,
    ) -> Result<RunResult, EngineError> {
        let risk = RiskEngine::new(self.config.risk.clone());
        let orders = OrderLedger::new(self.config.slippage.build());
        let executor = TradeExecutor::with_sink(risk, orders, strategy.name(), sink);
        self.run_with_executor(bars, strategy, executor)
    }

    fn run_with_executor(
        &mut self,
        bars: &[Bar],
        strategy: &mut dyn Strategy,
        mut executor: TradeExecutor,
    ) -> Result<RunResult, EngineError> {
        self.validate_input(bars)?;

        let warmup_bars = self.config.warmup_bars;
        let mut portfolio = PortfolioLedger::new(self.config.initial_balance);
        let mut rng = SimRng::new(self.config.seed).rng_for(&self.config.symbol);

        let mut equity_curve = Vec::with_capacity(bars.len());
        let mut signals = Vec::with_capacity(bars.len());
        let mut prices: HashMap<String, f64> = HashMap::new();

        for (t, bar) in bars.iter().enumerate() {
            self.phase = if t < warmup_bars {
                EnginePhase::Warmup
            } else {
                EnginePhase::Running
            };

            // Protective exits run before the new signal: stops placed on
            // earlier bars are honored against this bar's range, and a
            // position opened this bar is not exit-checked until the next.
            if portfolio.has_position(&bar.symbol) {
                executor.check_protective_exits(&mut portfolio, bar);
            }

            let signal = if self.phase == EnginePhase::Running {
                strategy.signal(&bars[t - warmup_bars..t])
            } else {
                Signal::None
            };

            if signal.is_entry() {
                let window = &bars[t - warmup_bars..t];
                executor.execute_signal(&mut portfolio, signal, window, bar, t, &mut rng);
            }

            prices.insert(bar.symbol.clone(), bar.close);
            let equity = portfolio.update_equity(&prices);
            equity_curve.push(equity);
            signals.push(signal);
        }

        self.phase = EnginePhase::Done;

        let final_equity = portfolio.total_equity();
        Ok(RunResult {
            equity_curve,
            signals,
            trades: portfolio.trade_history().to_vec(),
            fills: executor.order_ledger().fills().to_vec(),
            rejections: executor.rejections().to_vec(),
            final_equity,
            bar_count: bars.len(),
            warmup_bars,
        })
    }

    /// Malformed input stops the run before it starts: silently-wrong
    /// output is worse than no output.
    fn validate_input(&self, bars: &[Bar]) -> Result<(), EngineError> {
        for (index, bar) in bars.iter().enumerate() {
            if bar.symbol != self.config.symbol {
                return Err(EngineError::SymbolMismatch {
                    index,
                    found: bar.symbol.clone(),
                    expected: self.config.symbol.clone(),
                });
            }
            if !bar.is_sane() {
                return Err(EngineError::MalformedBar { index });
            }
            if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
                return Err(EngineError::NonMonotonicTimestamps { index });
            }
        }
        Ok(())
    }
}
