//! The user-supplied trading logic contract.

use btengine_model::OhlcvBar;

use crate::context::Context;
use crate::error::BacktestError;

/// Implemented by user strategies. `initialize` runs once before the
/// first bar; `on_data` runs once per bar, in ascending timestamp order.
/// A returned `Err` from either callback aborts the run.
pub trait Strategy {
    /// Called once before the first bar, with `context`'s per-bar fields
    /// still at their defaults.
    ///
    /// # Errors
    /// Any `Err` aborts the run before the first bar is processed.
    fn initialize(&mut self, context: &mut Context<'_>) -> Result<(), BacktestError>;

    /// Called once per bar, after liquidations for that bar have been
    /// processed and `context`'s per-bar fields refreshed.
    ///
    /// # Errors
    /// Any `Err` aborts the run; the snapshot for this bar is not taken.
    fn on_data(&mut self, context: &mut Context<'_>, bar: &OhlcvBar) -> Result<(), BacktestError>;
}
