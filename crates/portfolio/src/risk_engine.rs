//! Liquidation scanning and forced-close accounting.

use btengine_core::UnixNanos;
use btengine_model::{Action, Symbol, Trade};

use crate::core::PortfolioCore;

/// Non-owning view over a [`PortfolioCore`] exposing liquidation checks.
#[derive(Debug)]
pub struct RiskEngine<'a> {
    core: &'a PortfolioCore,
}

impl<'a> RiskEngine<'a> {
    #[must_use]
    pub fn new(core: &'a PortfolioCore) -> Self {
        Self { core }
    }

    /// Returns the symbols whose open position breaches the maintenance
    /// margin threshold at the given mark prices, in portfolio insertion
    /// order. `current_prices` must contain an entry for every open
    /// symbol that should be checked; symbols absent from it are skipped.
    #[must_use]
    pub fn scan_liquidations(&self, current_prices: &indexmap::IndexMap<Symbol, f64>) -> Vec<Symbol> {
        self.core.with_state(|state| {
            let rate = state.params.maintenance_margin_rate;
            state
                .positions
                .iter()
                .filter_map(|(symbol, position)| {
                    let price = current_prices.get(symbol)?;
                    position
                        .is_liquidation_risk(*price, rate)
                        .then_some(*symbol)
                })
                .collect()
        })
    }

    /// Force-closes `symbol` entirely at `price`, charging `fee` from the
    /// released margin and recording a `Liquidation` trade. Returns the
    /// realised PnL.
    ///
    /// # Errors
    /// Returns [`crate::error::PortfolioError::PositionNotFound`] if no
    /// position is open on `symbol`.
    pub fn close_at_price(
        &self,
        symbol: Symbol,
        price: f64,
        fee: f64,
        timestamp: UnixNanos,
    ) -> Result<f64, crate::error::PortfolioError> {
        self.core.with_state(|state| {
            let position = state
                .positions
                .shift_remove(&symbol)
                .ok_or(crate::error::PortfolioError::PositionNotFound { symbol })?;

            let unrealised = position.unrealised_pnl(price);
            let realised_pnl = unrealised - fee;
            state.cash += position.margin_used + unrealised - fee;

            state.trades.push(Trade {
                timestamp,
                symbol,
                action: Action::Liquidation,
                quantity: position.size.abs(),
                price,
                leverage: position.leverage,
                fee,
                position_type: position.position_type,
                pnl: realised_pnl,
                margin_used: position.margin_used,
            });

            Ok(realised_pnl)
        })
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
