//! Immutable trade-log entries, appended on every portfolio state change.

use btengine_core::UnixNanos;

use crate::enums::{Action, PositionType, Symbol};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trade {
    pub timestamp: UnixNanos,
    pub symbol: Symbol,
    pub action: Action,
    pub quantity: f64,
    pub price: f64,
    pub leverage: f64,
    pub fee: f64,
    pub position_type: PositionType,
    /// Realised PnL on this event; 0 for position opens.
    pub pnl: f64,
    /// Margin reserved at the time of the event.
    pub margin_used: f64,
}
