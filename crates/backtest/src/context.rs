//! The trading API and per-bar market state handed to a [`crate::strategy::Strategy`].

use btengine_core::UnixNanos;
use btengine_model::Symbol;
use btengine_portfolio::{OrderEngine, PortfolioCore, PortfolioMetrics, RiskEngine};

use crate::error::BacktestError;

/// Handed to the strategy on every callback. `symbol`, `current_price`,
/// and `current_time` are refreshed by the driver before each bar; the
/// trading/read methods operate against the live portfolio through the
/// same `PortfolioCore` the driver itself uses.
#[derive(Debug)]
pub struct Context<'a> {
    core: &'a PortfolioCore,
    pub symbol: Symbol,
    pub current_price: f64,
    pub current_time: UnixNanos,
}

impl<'a> Context<'a> {
    pub(crate) fn new(core: &'a PortfolioCore, symbol: Symbol) -> Self {
        Self {
            core,
            symbol,
            current_price: 0.0,
            current_time: UnixNanos::default(),
        }
    }

    /// Opens or adds to a Long at `current_price`.
    ///
    /// # Errors
    /// Returns [`BacktestError::Portfolio`] on validation failure or
    /// insufficient funds.
    pub fn buy(&self, amount: f64, leverage: f64) -> Result<(), BacktestError> {
        OrderEngine::new(self.core)
            .buy(self.symbol, amount, self.current_price, leverage, self.current_time)
            .map_err(BacktestError::from)
    }

    /// Opens or adds to a Short at `current_price`.
    ///
    /// # Errors
    /// Same conditions as [`Context::buy`].
    pub fn sell(&self, amount: f64, leverage: f64) -> Result<(), BacktestError> {
        OrderEngine::new(self.core)
            .sell(self.symbol, amount, self.current_price, leverage, self.current_time)
            .map_err(BacktestError::from)
    }

    /// Closes `percentage` (0, 100] of the open position at `current_price`.
    ///
    /// # Errors
    /// Returns [`BacktestError::Portfolio`] if no position is open, or on
    /// an invalid percentage.
    pub fn close_position(&self, percentage: f64) -> Result<(), BacktestError> {
        OrderEngine::new(self.core)
            .close_position(self.symbol, percentage, self.current_price, self.current_time)
            .map_err(BacktestError::from)
    }

    /// Signed size of the currently open position on `symbol` (0 if none).
    #[must_use]
    pub fn position_size(&self) -> f64 {
        self.core
            .with_state(|state| state.positions.get(&self.symbol).map_or(0.0, |p| p.size))
    }

    /// Current cash balance.
    #[must_use]
    pub fn cash(&self) -> f64 {
        self.core.with_state(|state| state.cash)
    }

    /// `(cash + unrealised_pnl at current_price) / used_margin`, or `+∞`
    /// with no open positions.
    #[must_use]
    pub fn margin_ratio(&self) -> f64 {
        let mut marks = indexmap::IndexMap::new();
        marks.insert(self.symbol, self.current_price);
        PortfolioMetrics::new(self.core).margin_ratio(&marks)
    }

    /// Unrealised PnL of the open position on `symbol` at `current_price`
    /// (0 if none).
    #[must_use]
    pub fn unrealised_pnl(&self) -> f64 {
        let mut prices = indexmap::IndexMap::new();
        prices.insert(self.symbol, self.current_price);
        PortfolioMetrics::new(self.core).unrealised_pnl(&prices)
    }

    /// Leverage of the currently open position on `symbol` (0 if none).
    #[must_use]
    pub fn leverage(&self) -> f64 {
        self.core
            .with_state(|state| state.positions.get(&self.symbol).map_or(0.0, |p| p.leverage))
    }

    pub(crate) fn risk_engine(&self) -> RiskEngine<'a> {
        RiskEngine::new(self.core)
    }
}
