//! Order execution — lifecycle ledger and slippage models.

pub mod ledger;
pub mod slippage;

pub use ledger::{FillResult, OrderLedger, OrderLedgerError};
pub use slippage::{
    latency_fill_check, LatencyFill, NoSlippage, ParametricSlippage, SlippageModel,
    MIN_EXECUTION_PRICE,
};
