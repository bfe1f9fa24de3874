//! Buy/sell/close operations on top of [`PortfolioCore`], with input
//! validation, fee calculation, and trade recording. Every operation is
//! atomic: either it fully applies, or (on validation/insufficient-funds
//! failure) it leaves the state untouched.

use btengine_core::UnixNanos;
use btengine_core::correctness::{check_in_range_inclusive, check_positive};
use btengine_model::{
    Action, MAX_TRADE_SIZE, MIN_TRADE_SIZE, Position, PositionType, Symbol, Trade, TradingMode,
};

use crate::core::{PortfolioCore, PortfolioState};
use crate::error::PortfolioError;

/// Non-owning view over a [`PortfolioCore`] exposing order operations.
#[derive(Debug)]
pub struct OrderEngine<'a> {
    core: &'a PortfolioCore,
}

impl<'a> OrderEngine<'a> {
    #[must_use]
    pub fn new(core: &'a PortfolioCore) -> Self {
        Self { core }
    }

    /// Opens or adds to a Long (closing an existing Short first, if one
    /// exists on this symbol).
    ///
    /// # Errors
    /// Returns [`PortfolioError::Validation`] on invalid inputs and
    /// [`PortfolioError::InsufficientFunds`] if cash cannot cover the
    /// margin plus fee for any newly-opened exposure.
    pub fn buy(
        &self,
        symbol: Symbol,
        amount: f64,
        price: f64,
        leverage: f64,
        timestamp: UnixNanos,
    ) -> Result<(), PortfolioError> {
        self.core.with_state(|state| {
            validate_order_inputs(state, amount, price, leverage)?;
            execute_side(state, symbol, amount, price, leverage, timestamp, Side::Buy)
        })
    }

    /// Opens or adds to a Short (closing an existing Long first, if one
    /// exists on this symbol). A freshly-opened Short requires Futures
    /// mode.
    ///
    /// # Errors
    /// Same conditions as [`OrderEngine::buy`].
    pub fn sell(
        &self,
        symbol: Symbol,
        amount: f64,
        price: f64,
        leverage: f64,
        timestamp: UnixNanos,
    ) -> Result<(), PortfolioError> {
        self.core.with_state(|state| {
            validate_order_inputs(state, amount, price, leverage)?;
            execute_side(state, symbol, amount, price, leverage, timestamp, Side::Sell)
        })
    }

    /// Closes `percentage` (0, 100] of the open position on `symbol` at
    /// `price`.
    ///
    /// # Errors
    /// Returns [`PortfolioError::PositionNotFound`] if no position is
    /// open on `symbol`, or [`PortfolioError::Validation`] if
    /// `percentage` is out of `(0, 100]`.
    pub fn close_position(
        &self,
        symbol: Symbol,
        percentage: f64,
        price: f64,
        timestamp: UnixNanos,
    ) -> Result<(), PortfolioError> {
        self.core.with_state(|state| {
            check_in_range_inclusive(percentage, f64::EPSILON, 100.0, "percentage")?;
            check_positive(price, "price")?;

            let position = *state
                .positions
                .get(&symbol)
                .ok_or(PortfolioError::PositionNotFound { symbol })?;

            let close_qty = position.size.abs() * percentage / 100.0;
            let fee = close_qty * price * state.params.taker_fee_rate;
            let realised_pnl = position.unrealised_pnl(price) * percentage / 100.0;
            let margin_released = position.margin_used * percentage / 100.0;

            state.cash += margin_released + realised_pnl - fee;

            let remaining = position.size.abs() - close_qty;
            if percentage >= 100.0 - f64::EPSILON || remaining < MIN_TRADE_SIZE {
                state.positions.shift_remove(&symbol);
            } else {
                let mut updated = position;
                let sign = if position.position_type == PositionType::Long {
                    1.0
                } else {
                    -1.0
                };
                updated.size = sign * remaining;
                updated.margin_used = position.margin_used - margin_released;
                state.positions.insert(symbol, updated);
            }

            let action = match position.position_type {
                PositionType::Long => Action::Sell,
                PositionType::Short => Action::Buy,
            };
            state.trades.push(Trade {
                timestamp,
                symbol,
                action,
                quantity: close_qty,
                price,
                leverage: position.leverage,
                fee,
                position_type: position.position_type,
                pnl: realised_pnl,
                margin_used: position.margin_used,
            });

            Ok(())
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Buy,
    Sell,
}

fn validate_order_inputs(
    state: &PortfolioState,
    amount: f64,
    price: f64,
    leverage: f64,
) -> Result<(), PortfolioError> {
    check_positive(amount, "amount")?;
    check_positive(price, "price")?;
    check_positive(leverage, "leverage")?;
    check_in_range_inclusive(amount, MIN_TRADE_SIZE, MAX_TRADE_SIZE, "amount")?;
    if leverage > state.params.max_leverage {
        return Err(btengine_model::ModelError::validation(format!(
            "leverage {leverage} exceeds max_leverage {}",
            state.params.max_leverage
        ))
        .into());
    }
    if state.params.trading_mode == TradingMode::Spot && (leverage - 1.0).abs() > f64::EPSILON {
        return Err(btengine_model::ModelError::validation(
            "leverage must equal 1 in Spot mode",
        )
        .into());
    }
    Ok(())
}

/// Executes one `buy` or `sell`, handling the three cases from the
/// component design: closing the opposite side (with optional residual
/// open), averaging into the same side, or opening fresh.
fn execute_side(
    state: &mut PortfolioState,
    symbol: Symbol,
    amount: f64,
    price: f64,
    leverage: f64,
    timestamp: UnixNanos,
    side: Side,
) -> Result<(), PortfolioError> {
    let opposite_type = match side {
        Side::Buy => PositionType::Short,
        Side::Sell => PositionType::Long,
    };
    let same_type = match side {
        Side::Buy => PositionType::Long,
        Side::Sell => PositionType::Short,
    };

    let existing = state.positions.get(&symbol).copied();

    match existing {
        Some(position) if position.position_type == opposite_type => {
            close_opposite_then_open_residual(
                state, symbol, amount, price, leverage, timestamp, side, position,
            )
        }
        Some(position) if position.position_type == same_type => {
            average_into_position(state, symbol, amount, price, leverage, timestamp, side, position)
        }
        _ => open_fresh(state, symbol, amount, price, leverage, timestamp, side),
    }
}

fn notional_fee_margin(
    mode: TradingMode,
    amount: f64,
    price: f64,
    leverage: f64,
    fee_rate: f64,
) -> (f64, f64, f64) {
    let notional = amount * price;
    let margin = match mode {
        TradingMode::Spot => notional,
        TradingMode::Futures => notional / leverage,
    };
    let fee = notional * fee_rate;
    (notional, margin, fee)
}

fn open_fresh(
    state: &mut PortfolioState,
    symbol: Symbol,
    amount: f64,
    price: f64,
    leverage: f64,
    timestamp: UnixNanos,
    side: Side,
) -> Result<(), PortfolioError> {
    if side == Side::Sell && state.params.trading_mode == TradingMode::Spot {
        return Err(btengine_model::ModelError::validation(
            "selling an asset not held requires Futures mode (opening a Short)",
        )
        .into());
    }

    let (_, margin_needed, fee) = notional_fee_margin(
        state.params.trading_mode,
        amount,
        price,
        leverage,
        state.params.taker_fee_rate,
    );
    if state.cash < margin_needed + fee {
        return Err(PortfolioError::InsufficientFunds {
            required: margin_needed + fee,
            available: state.cash,
        });
    }

    let position = match side {
        Side::Buy => {
            Position::create_long(symbol, amount, price, leverage, timestamp, state.params.trading_mode)
        }
        Side::Sell => Position::create_short(
            symbol,
            amount,
            price,
            leverage,
            timestamp,
            state.params.trading_mode,
        ),
    }?;

    state.cash -= margin_needed + fee;
    state.positions.insert(symbol, position);
    state.trades.push(Trade {
        timestamp,
        symbol,
        action: action_for(side),
        quantity: amount,
        price,
        leverage,
        fee,
        position_type: position.position_type,
        pnl: 0.0,
        margin_used: position.margin_used,
    });
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn average_into_position(
    state: &mut PortfolioState,
    symbol: Symbol,
    amount: f64,
    price: f64,
    leverage: f64,
    timestamp: UnixNanos,
    side: Side,
    position: Position,
) -> Result<(), PortfolioError> {
    // Margins are summed directly: the existing portion keeps whatever
    // margin it was opened at, the new fill's margin uses the leverage
    // supplied with this order. Neither side is re-margined.
    let (_, margin_needed, fee) = notional_fee_margin(
        state.params.trading_mode,
        amount,
        price,
        leverage,
        state.params.taker_fee_rate,
    );
    if state.cash < margin_needed + fee {
        return Err(PortfolioError::InsufficientFunds {
            required: margin_needed + fee,
            available: state.cash,
        });
    }

    let existing_size = position.size.abs();
    let new_size = existing_size + amount;
    let new_entry_price =
        (existing_size * position.entry_price + amount * price) / new_size;

    let mut updated = position;
    updated.size = if position.position_type == PositionType::Long {
        new_size
    } else {
        -new_size
    };
    updated.entry_price = new_entry_price;
    updated.margin_used += margin_needed;

    state.cash -= margin_needed + fee;
    state.positions.insert(symbol, updated);
    state.trades.push(Trade {
        timestamp,
        symbol,
        action: action_for(side),
        quantity: amount,
        price,
        leverage,
        fee,
        position_type: updated.position_type,
        pnl: 0.0,
        margin_used: updated.margin_used,
    });
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn close_opposite_then_open_residual(
    state: &mut PortfolioState,
    symbol: Symbol,
    amount: f64,
    price: f64,
    leverage: f64,
    timestamp: UnixNanos,
    side: Side,
    position: Position,
) -> Result<(), PortfolioError> {
    let existing_size = position.size.abs();
    let filled = amount.min(existing_size);
    let residual = amount - filled;

    // Fee is charged on the whole requested amount at submission time,
    // split across the close and any residual open proportionally.
    let (_, _, total_fee) = notional_fee_margin(
        state.params.trading_mode,
        amount,
        price,
        leverage,
        state.params.taker_fee_rate,
    );
    let close_fee = if amount > 0.0 {
        total_fee * filled / amount
    } else {
        0.0
    };
    let open_fee = total_fee - close_fee;

    let realised_pnl = match position.position_type {
        PositionType::Long => (price - position.entry_price) * filled,
        PositionType::Short => (position.entry_price - price) * filled,
    };
    let margin_released = position.margin_used * (filled / existing_size);

    // Validate affordability of any residual open before committing
    // anything, so the whole operation is atomic on failure.
    let residual_margin = if residual > MIN_TRADE_SIZE {
        let (_, margin, _) = notional_fee_margin(
            state.params.trading_mode,
            residual,
            price,
            leverage,
            state.params.taker_fee_rate,
        );
        let projected_cash = state.cash + margin_released + realised_pnl - close_fee;
        if projected_cash < margin + open_fee {
            return Err(PortfolioError::InsufficientFunds {
                required: margin + open_fee,
                available: projected_cash,
            });
        }
        Some(margin)
    } else {
        None
    };

    state.cash += margin_released + realised_pnl - close_fee;

    let remaining = existing_size - filled;
    if remaining < MIN_TRADE_SIZE {
        state.positions.shift_remove(&symbol);
    } else {
        let mut updated = position;
        let sign = if position.position_type == PositionType::Long {
            1.0
        } else {
            -1.0
        };
        updated.size = sign * remaining;
        updated.margin_used = position.margin_used - margin_released;
        state.positions.insert(symbol, updated);
    }

    state.trades.push(Trade {
        timestamp,
        symbol,
        action: action_for(side),
        quantity: filled,
        price,
        leverage: position.leverage,
        fee: close_fee,
        position_type: position.position_type,
        pnl: realised_pnl,
        margin_used: position.margin_used,
    });

    if let Some(margin) = residual_margin {
        state.cash -= margin + open_fee;
        let new_position = match side {
            Side::Buy => Position::create_long(
                symbol,
                residual,
                price,
                leverage,
                timestamp,
                state.params.trading_mode,
            ),
            Side::Sell => Position::create_short(
                symbol,
                residual,
                price,
                leverage,
                timestamp,
                state.params.trading_mode,
            ),
        }?;
        state.positions.insert(symbol, new_position);
        state.trades.push(Trade {
            timestamp,
            symbol,
            action: action_for(side),
            quantity: residual,
            price,
            leverage,
            fee: open_fee,
            position_type: new_position.position_type,
            pnl: 0.0,
            margin_used: new_position.margin_used,
        });
    }

    Ok(())
}

fn action_for(side: Side) -> Action {
    match side {
        Side::Buy => Action::Buy,
        Side::Sell => Action::Sell,
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::core::PortfolioParams;

    fn spot_core(capital: f64) -> PortfolioCore {
        PortfolioCore::new(
            capital,
            PortfolioParams {
                trading_mode: TradingMode::Spot,
                max_leverage: 1.0,
                maintenance_margin_rate: 0.005,
                taker_fee_rate: 0.0,
            },
        )
    }

    fn futures_core(capital: f64, max_leverage: f64, fee_rate: f64) -> PortfolioCore {
        PortfolioCore::new(
            capital,
            PortfolioParams {
                trading_mode: TradingMode::Futures,
                max_leverage,
                maintenance_margin_rate: 0.005,
                taker_fee_rate: fee_rate,
            },
        )
    }

    fn sym() -> Symbol {
        Symbol::new("BTCUSDT")
    }

    #[rstest]
    fn test_spot_buy_and_hold() {
        let core = spot_core(10_000.0);
        let engine = OrderEngine::new(&core);
        engine
            .buy(sym(), 50.0, 100.0, 1.0, UnixNanos::new(0))
            .unwrap();
        core.with_state(|state| {
            assert_eq!(state.cash, 5_000.0);
            assert_eq!(state.trades.len(), 1);
            assert_eq!(state.positions.get(&sym()).unwrap().size, 50.0);
        });
    }

    #[rstest]
    fn test_spot_sell_unheld_asset_fails_validation() {
        let core = spot_core(10_000.0);
        let engine = OrderEngine::new(&core);
        let result = engine.sell(sym(), 1.0, 100.0, 1.0, UnixNanos::new(0));
        assert!(matches!(result, Err(PortfolioError::Validation(_))));
    }

    #[rstest]
    fn test_spot_max_leverage_one_rejects_leverage_above_one() {
        let core = spot_core(10_000.0);
        let engine = OrderEngine::new(&core);
        let result = engine.buy(sym(), 1.0, 100.0, 2.0, UnixNanos::new(0));
        assert!(result.is_err());
    }

    #[rstest]
    fn test_futures_long_open_then_liquidation_scenario() {
        // Spec §8 scenario 2: initial 1000, leverage 10, fee 0.
        let core = futures_core(1_000.0, 10.0, 0.0);
        let engine = OrderEngine::new(&core);
        engine.buy(sym(), 10.0, 100.0, 10.0, UnixNanos::new(0)).unwrap();
        core.with_state(|state| {
            assert_eq!(state.cash, 900.0);
            assert_eq!(state.positions.get(&sym()).unwrap().margin_used, 100.0);
        });
    }

    #[rstest]
    fn test_short_average_in_and_partial_close_scenario() {
        // Spec §8 scenario 3.
        let core = futures_core(10_000.0, 5.0, 0.0);
        let engine = OrderEngine::new(&core);
        engine.sell(sym(), 1.0, 200.0, 5.0, UnixNanos::new(0)).unwrap();
        engine.sell(sym(), 1.0, 180.0, 5.0, UnixNanos::new(1)).unwrap();
        core.with_state(|state| {
            let position = state.positions.get(&sym()).unwrap();
            assert_eq!(position.size, -2.0);
            assert!((position.entry_price - 190.0).abs() < 1e-9);
        });
        engine.close_position(sym(), 50.0, 170.0, UnixNanos::new(2)).unwrap();
        core.with_state(|state| {
            let position = state.positions.get(&sym()).unwrap();
            assert!((position.size.abs() - 1.0).abs() < 1e-9);
        });
    }

    #[rstest]
    fn test_close_position_100_percent_removes_position() {
        let core = spot_core(10_000.0);
        let engine = OrderEngine::new(&core);
        engine.buy(sym(), 10.0, 100.0, 1.0, UnixNanos::new(0)).unwrap();
        engine
            .close_position(sym(), 100.0, 100.0, UnixNanos::new(1))
            .unwrap();
        core.with_state(|state| {
            assert!(!state.positions.contains_key(&sym()));
            assert_eq!(state.cash, 10_000.0);
            assert_eq!(state.trades.len(), 2);
        });
    }

    #[rstest]
    fn test_close_position_50_percent_halves_size_and_margin() {
        let core = spot_core(10_000.0);
        let engine = OrderEngine::new(&core);
        engine.buy(sym(), 10.0, 100.0, 1.0, UnixNanos::new(0)).unwrap();
        engine
            .close_position(sym(), 50.0, 100.0, UnixNanos::new(1))
            .unwrap();
        core.with_state(|state| {
            let position = state.positions.get(&sym()).unwrap();
            assert_eq!(position.size, 5.0);
            assert_eq!(position.margin_used, 500.0);
        });
    }

    #[rstest]
    fn test_close_position_on_absent_symbol_fails() {
        let core = spot_core(10_000.0);
        let engine = OrderEngine::new(&core);
        let result = engine.close_position(sym(), 100.0, 100.0, UnixNanos::new(0));
        assert!(matches!(result, Err(PortfolioError::PositionNotFound { .. })));
    }

    #[rstest]
    fn test_insufficient_funds_rejected_atomically() {
        let core = spot_core(100.0);
        let engine = OrderEngine::new(&core);
        let result = engine.buy(sym(), 10.0, 100.0, 1.0, UnixNanos::new(0));
        assert!(matches!(result, Err(PortfolioError::InsufficientFunds { .. })));
        core.with_state(|state| {
            assert_eq!(state.cash, 100.0);
            assert!(state.positions.is_empty());
        });
    }
}
