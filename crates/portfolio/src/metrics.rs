//! Read-only portfolio valuation queries.

use indexmap::IndexMap;

use btengine_model::Symbol;

use crate::core::PortfolioCore;

/// Non-owning view over a [`PortfolioCore`] exposing point-in-time
/// valuation queries. Every method takes the current mark prices for
/// whichever symbols it needs and snapshots just the fields it reads.
#[derive(Debug)]
pub struct PortfolioMetrics<'a> {
    core: &'a PortfolioCore,
}

impl<'a> PortfolioMetrics<'a> {
    #[must_use]
    pub fn new(core: &'a PortfolioCore) -> Self {
        Self { core }
    }

    /// Cash plus the mark-to-market value of every open position at
    /// `current_prices`. Symbols with no entry in `current_prices`
    /// contribute their entry-price valuation instead (stale mark).
    #[must_use]
    pub fn portfolio_value(&self, current_prices: &IndexMap<Symbol, f64>) -> f64 {
        self.core.with_state(|state| {
            let positions_value: f64 = state
                .positions
                .iter()
                .map(|(symbol, position)| {
                    let price = current_prices
                        .get(symbol)
                        .copied()
                        .unwrap_or(position.entry_price);
                    position.position_value(price)
                })
                .sum();
            state.cash + positions_value
        })
    }

    /// Total margin currently reserved across all open positions.
    #[must_use]
    pub fn used_margin(&self) -> f64 {
        self.core
            .with_state(|state| state.positions.values().map(|p| p.margin_used).sum())
    }

    /// `(cash + unrealised_pnl at marks) / used_margin`, or `+∞` if no
    /// margin is currently used. Symbols with no entry in `marks`
    /// contribute zero unrealised PnL.
    #[must_use]
    pub fn margin_ratio(&self, marks: &IndexMap<Symbol, f64>) -> f64 {
        self.core.with_state(|state| {
            let used: f64 = state.positions.values().map(|p| p.margin_used).sum();
            if used <= 0.0 {
                return f64::INFINITY;
            }
            let unrealised: f64 = state
                .positions
                .iter()
                .map(|(symbol, position)| {
                    marks
                        .get(symbol)
                        .map_or(0.0, |price| position.unrealised_pnl(*price))
                })
                .sum();
            (state.cash + unrealised) / used
        })
    }

    /// Sum of realised PnL across every recorded trade.
    #[must_use]
    pub fn realised_pnl(&self) -> f64 {
        self.core
            .with_state(|state| state.trades.iter().map(|t| t.pnl).sum())
    }

    /// Sum of unrealised PnL across all open positions at
    /// `current_prices`. Symbols with no entry contribute zero.
    #[must_use]
    pub fn unrealised_pnl(&self, current_prices: &IndexMap<Symbol, f64>) -> f64 {
        self.core.with_state(|state| {
            state
                .positions
                .iter()
                .map(|(symbol, position)| {
                    current_prices
                        .get(symbol)
                        .map_or(0.0, |price| position.unrealised_pnl(*price))
                })
                .sum()
        })
    }

    /// Aggregate leverage across open positions, weighted by each
    /// position's notional share (trade-count-weighted average when no
    /// notional is open).
    #[must_use]
    pub fn avg_leverage(&self) -> f64 {
        self.core.with_state(|state| {
            if state.positions.is_empty() {
                return 0.0;
            }
            let total_notional: f64 = state
                .positions
                .values()
                .map(|p| p.size.abs() * p.entry_price)
                .sum();
            if total_notional <= 0.0 {
                let sum: f64 = state.positions.values().map(|p| p.leverage).sum();
                return sum / state.positions.len() as f64;
            }
            state
                .positions
                .values()
                .map(|p| p.leverage * (p.size.abs() * p.entry_price / total_notional))
                .sum()
        })
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use btengine_core::UnixNanos;
    use btengine_model::{Position, TradingMode};
    use rstest::rstest;

    use super::*;
    use crate::core::PortfolioParams;

    fn sym() -> Symbol {
        Symbol::new("BTCUSDT")
    }

    fn core_with_position(capital: f64, size: f64, entry: f64, leverage: f64) -> PortfolioCore {
        let core = PortfolioCore::new(
            capital,
            PortfolioParams {
                trading_mode: TradingMode::Futures,
                max_leverage: leverage,
                maintenance_margin_rate: 0.005,
                taker_fee_rate: 0.0,
            },
        );
        core.with_state(|state| {
            let position = Position::create_long(
                sym(),
                size,
                entry,
                leverage,
                UnixNanos::new(0),
                TradingMode::Futures,
            )
            .unwrap();
            state.cash -= position.margin_used;
            state.positions.insert(sym(), position);
        });
        core
    }

    #[rstest]
    fn test_portfolio_value_combines_cash_and_position_value() {
        let core = core_with_position(1_000.0, 10.0, 100.0, 10.0);
        let metrics = PortfolioMetrics::new(&core);
        let mut prices = IndexMap::new();
        prices.insert(sym(), 110.0);
        assert_eq!(metrics.portfolio_value(&prices), 900.0 + 1_100.0);
    }

    #[rstest]
    fn test_margin_ratio_is_infinite_with_no_open_positions() {
        let core = PortfolioCore::new(
            1_000.0,
            PortfolioParams {
                trading_mode: TradingMode::Spot,
                max_leverage: 1.0,
                maintenance_margin_rate: 0.005,
                taker_fee_rate: 0.0,
            },
        );
        let metrics = PortfolioMetrics::new(&core);
        assert_eq!(metrics.margin_ratio(&IndexMap::new()), f64::INFINITY);
    }

    #[rstest]
    fn test_margin_ratio_with_open_position_at_entry_price() {
        let core = core_with_position(1_000.0, 10.0, 100.0, 10.0);
        let metrics = PortfolioMetrics::new(&core);
        let mut marks = IndexMap::new();
        marks.insert(sym(), 100.0);
        assert_eq!(metrics.margin_ratio(&marks), 900.0 / 100.0);
    }

    #[rstest]
    fn test_margin_ratio_includes_unrealised_pnl_at_marks() {
        let core = core_with_position(1_000.0, 10.0, 100.0, 10.0);
        let metrics = PortfolioMetrics::new(&core);
        let mut marks = IndexMap::new();
        marks.insert(sym(), 110.0);
        // unrealised pnl = (110 - 100) * 10 = 100, cash = 900, used_margin = 100.
        assert_eq!(metrics.margin_ratio(&marks), (900.0 + 100.0) / 100.0);
    }

    #[rstest]
    fn test_unrealised_pnl_zero_for_unpriced_symbol() {
        let core = core_with_position(1_000.0, 10.0, 100.0, 10.0);
        let metrics = PortfolioMetrics::new(&core);
        assert_eq!(metrics.unrealised_pnl(&IndexMap::new()), 0.0);
    }

    #[rstest]
    fn test_avg_leverage_zero_with_no_positions() {
        let core = PortfolioCore::new(
            1_000.0,
            PortfolioParams {
                trading_mode: TradingMode::Spot,
                max_leverage: 1.0,
                maintenance_margin_rate: 0.005,
                taker_fee_rate: 0.0,
            },
        );
        let metrics = PortfolioMetrics::new(&core);
        assert_eq!(metrics.avg_leverage(), 0.0);
    }

    #[rstest]
    fn test_avg_leverage_single_position() {
        let core = core_with_position(1_000.0, 10.0, 100.0, 10.0);
        let metrics = PortfolioMetrics::new(&core);
        assert_eq!(metrics.avg_leverage(), 10.0);
    }
}
