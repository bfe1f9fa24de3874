//! The output of a completed (or aborted) run.

use btengine_model::{Position, Snapshot, Symbol, Trade};

/// Whether a run completed normally or was aborted by a strategy error.
#[derive(Clone, Debug, PartialEq)]
pub enum RunStatus {
    Completed,
    Failed { message: String },
}

/// A snapshot of the portfolio's final state: cash and whatever
/// positions remained open when the run ended.
#[derive(Clone, Debug, PartialEq)]
pub struct FinalState {
    pub cash: f64,
    pub positions: Vec<(Symbol, Position)>,
}

/// Everything produced by one [`crate::driver::BacktestDriver::run`] call.
/// `history` and `trades` retain whatever was recorded up to the point of
/// failure, if any; they are never discarded on abort.
#[derive(Clone, Debug, PartialEq)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub history: Vec<Snapshot>,
    pub final_state: FinalState,
    pub status: RunStatus,
}
