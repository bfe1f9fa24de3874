//! Bar-by-bar backtest driver: loads an OHLCV window, steps a strategy
//! through it against a live portfolio, and records the trade and
//! snapshot history. Post-run statistics are computed separately by
//! `btengine_analysis::MetricsCalculator`.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]

pub mod context;
pub mod driver;
pub mod error;
pub mod result;
pub mod strategy;

pub use crate::context::Context;
pub use crate::driver::BacktestDriver;
pub use crate::error::BacktestError;
pub use crate::result::{BacktestResult, FinalState, RunStatus};
pub use crate::strategy::Strategy;
