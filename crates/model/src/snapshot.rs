//! Per-bar portfolio-state record used to build time-series metrics.

use btengine_core::UnixNanos;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Snapshot {
    pub timestamp: UnixNanos,
    pub portfolio_value: f64,
    pub cash: f64,
    pub unrealised_pnl: f64,
    pub realised_pnl: f64,
    pub margin_used: f64,
    pub position_count: usize,
    pub leverage_ratio: f64,
}
