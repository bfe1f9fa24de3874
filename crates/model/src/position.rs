//! A single open exposure in one symbol.

use btengine_core::UnixNanos;

use crate::enums::{PositionType, Symbol, TradingMode};
use crate::error::ModelError;

/// An open position. `size` is signed: positive for Long, negative for
/// Short. `margin_used` is the cash collateral reserved against it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub symbol: Symbol,
    pub size: f64,
    pub entry_price: f64,
    pub leverage: f64,
    pub opened_at: UnixNanos,
    pub position_type: PositionType,
    pub margin_used: f64,
    pub mode: TradingMode,
}

impl Position {
    fn margin_for(
        mode: TradingMode,
        notional: f64,
        leverage: f64,
    ) -> f64 {
        match mode {
            TradingMode::Spot => notional,
            TradingMode::Futures => notional / leverage,
        }
    }

    /// Opens a new Long position.
    ///
    /// # Errors
    /// Returns [`ModelError::Validation`] if `size`/`entry_price`/`leverage`
    /// are not strictly positive and finite.
    pub fn create_long(
        symbol: Symbol,
        size: f64,
        entry_price: f64,
        leverage: f64,
        opened_at: UnixNanos,
        mode: TradingMode,
    ) -> Result<Self, ModelError> {
        Self::validate_open(size, entry_price, leverage)?;
        let notional = size * entry_price;
        Ok(Self {
            symbol,
            size,
            entry_price,
            leverage,
            opened_at,
            position_type: PositionType::Long,
            margin_used: Self::margin_for(mode, notional, leverage),
            mode,
        })
    }

    /// Opens a new Short position. Illegal in Spot mode.
    ///
    /// # Errors
    /// Returns [`ModelError::Validation`] if `mode` is Spot, or if
    /// `size`/`entry_price`/`leverage` are not strictly positive and
    /// finite.
    pub fn create_short(
        symbol: Symbol,
        size: f64,
        entry_price: f64,
        leverage: f64,
        opened_at: UnixNanos,
        mode: TradingMode,
    ) -> Result<Self, ModelError> {
        if mode == TradingMode::Spot {
            return Err(ModelError::validation(
                "short positions are not permitted in Spot mode",
            ));
        }
        Self::validate_open(size, entry_price, leverage)?;
        let notional = size * entry_price;
        Ok(Self {
            symbol,
            size: -size,
            entry_price,
            leverage,
            opened_at,
            position_type: PositionType::Short,
            margin_used: Self::margin_for(mode, notional, leverage),
            mode,
        })
    }

    /// Opens a position whose side is inferred from `signed_size`'s sign
    /// (positive -> Long, negative -> Short).
    ///
    /// # Errors
    /// Returns [`ModelError::Validation`] under the same conditions as
    /// [`Position::create_long`] / [`Position::create_short`], or if
    /// `signed_size` is zero.
    pub fn create_from_trade(
        symbol: Symbol,
        signed_size: f64,
        entry_price: f64,
        leverage: f64,
        opened_at: UnixNanos,
        mode: TradingMode,
    ) -> Result<Self, ModelError> {
        if signed_size > 0.0 {
            Self::create_long(symbol, signed_size, entry_price, leverage, opened_at, mode)
        } else if signed_size < 0.0 {
            Self::create_short(
                symbol,
                signed_size.abs(),
                entry_price,
                leverage,
                opened_at,
                mode,
            )
        } else {
            Err(ModelError::validation(
                "cannot open a position with zero size",
            ))
        }
    }

    fn validate_open(size: f64, entry_price: f64, leverage: f64) -> Result<(), ModelError> {
        btengine_core::correctness::check_positive(size, "size")?;
        btengine_core::correctness::check_positive(entry_price, "entry_price")?;
        btengine_core::correctness::check_positive(leverage, "leverage")?;
        Ok(())
    }

    /// Unrealised PnL at `mark_price`.
    #[must_use]
    pub fn unrealised_pnl(&self, mark_price: f64) -> f64 {
        match self.position_type {
            PositionType::Long => (mark_price - self.entry_price) * self.size.abs(),
            PositionType::Short => (self.entry_price - mark_price) * self.size.abs(),
        }
    }

    /// True iff the unrealised loss at `mark_price` breaches the
    /// maintenance margin threshold. Spot positions can never be
    /// liquidated (no borrowed exposure).
    #[must_use]
    pub fn is_liquidation_risk(&self, mark_price: f64, maintenance_rate: f64) -> bool {
        if self.mode == TradingMode::Spot {
            return false;
        }
        self.unrealised_pnl(mark_price) <= -(self.margin_used * (1.0 - maintenance_rate))
    }

    /// Notional value of the position at `mark_price` (Spot valuation).
    #[must_use]
    pub fn position_value(&self, mark_price: f64) -> f64 {
        self.size.abs() * mark_price
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn sym() -> Symbol {
        Symbol::new("BTCUSDT")
    }

    #[rstest]
    fn test_create_short_rejected_in_spot() {
        let result = Position::create_short(
            sym(),
            1.0,
            100.0,
            1.0,
            UnixNanos::default(),
            TradingMode::Spot,
        );
        assert!(result.is_err());
    }

    #[rstest]
    fn test_long_unrealised_pnl() {
        let pos = Position::create_long(
            sym(),
            2.0,
            100.0,
            1.0,
            UnixNanos::default(),
            TradingMode::Spot,
        )
        .unwrap();
        assert_eq!(pos.unrealised_pnl(110.0), 20.0);
        assert_eq!(pos.unrealised_pnl(90.0), -20.0);
    }

    #[rstest]
    fn test_short_unrealised_pnl() {
        let pos = Position::create_short(
            sym(),
            2.0,
            100.0,
            5.0,
            UnixNanos::default(),
            TradingMode::Futures,
        )
        .unwrap();
        assert_eq!(pos.size, -2.0);
        assert_eq!(pos.unrealised_pnl(90.0), 20.0);
    }

    #[rstest]
    fn test_futures_margin_is_notional_over_leverage() {
        let pos = Position::create_long(
            sym(),
            10.0,
            100.0,
            10.0,
            UnixNanos::default(),
            TradingMode::Futures,
        )
        .unwrap();
        assert_eq!(pos.margin_used, 100.0);
    }

    #[rstest]
    fn test_spot_margin_is_full_notional() {
        let pos = Position::create_long(
            sym(),
            10.0,
            100.0,
            1.0,
            UnixNanos::default(),
            TradingMode::Spot,
        )
        .unwrap();
        assert_eq!(pos.margin_used, 1000.0);
    }

    #[rstest]
    fn test_liquidation_risk_scenario_from_spec() {
        // Bar 1 price 100 => buy(10,10): notional 1000, margin 100.
        // Bar 2 price 89: unrealised = (89-100)*10 = -110 <= -(100*0.995) = -99.5
        let pos = Position::create_long(
            sym(),
            10.0,
            100.0,
            10.0,
            UnixNanos::default(),
            TradingMode::Futures,
        )
        .unwrap();
        assert!(pos.is_liquidation_risk(89.0, 0.005));
        assert!(!pos.is_liquidation_risk(99.0, 0.005));
    }

    #[rstest]
    fn test_spot_position_never_liquidation_risk() {
        let pos = Position::create_long(
            sym(),
            10.0,
            100.0,
            1.0,
            UnixNanos::default(),
            TradingMode::Spot,
        )
        .unwrap();
        assert!(!pos.is_liquidation_risk(0.01, 0.005));
    }
}
