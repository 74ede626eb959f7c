//! Strategy boundary — the signal oracle consumed by the engine.
//!
//! The simulation core treats strategies as opaque, possibly-stateful
//! collaborators: given a trailing window of bars, produce a signal.
//! Indicator arithmetic lives behind this trait, outside the core.

use crate::domain::Bar;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading signal for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
    #[serde(rename = "NONE")]
    None,
}

impl Signal {
    pub fn is_entry(self) -> bool {
        matches!(self, Signal::Buy | Signal::Sell)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::None => "NONE",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signal oracle. `window` is the trailing bar window, oldest first,
/// excluding the bar currently being processed.
pub trait Strategy {
    fn signal(&mut self, window: &[Bar]) -> Signal;

    /// Label forwarded to the trade sink with open events.
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// Never trades. Baseline for engine tests.
#[derive(Debug, Default)]
pub struct NullStrategy;

impl Strategy for NullStrategy {
    fn signal(&mut self, _window: &[Bar]) -> Signal {
        Signal::None
    }

    fn name(&self) -> &str {
        "null"
    }
}

/// Replays a fixed signal script, one entry per call, then `None` forever.
/// Lets tests drive the engine into exact scenarios.
#[derive(Debug)]
pub struct ScriptedStrategy {
    script: Vec<Signal>,
    cursor: usize,
}

impl ScriptedStrategy {
    pub fn new(script: Vec<Signal>) -> Self {
        Self { script, cursor: 0 }
    }
}

impl Strategy for ScriptedStrategy {
    fn signal(&mut self, _window: &[Bar]) -> Signal {
        let signal = self.script.get(self.cursor).copied().unwrap_or(Signal::None);
        self.cursor += 1;
        signal
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
