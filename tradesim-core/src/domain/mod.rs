//! Domain types for the simulation core.

pub mod bar;
pub mod ids;
pub mod order;
pub mod portfolio;
pub mod position;
pub mod trade;

pub use bar::Bar;
pub use ids::{IdGen, OrderId};
pub use order::{Order, OrderKind, OrderSide, OrderStatus};
pub use portfolio::{PortfolioError, PortfolioLedger};
pub use position::{Position, PositionSide};
pub use trade::{CloseReason, TradeRecord};

/// Symbol type alias.
pub type Symbol = String;
