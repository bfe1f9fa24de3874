//! The run configuration surface (`BacktestConfig`), validated eagerly at
//! construction so that no invalid value is ever observed downstream.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enums::{Symbol, Timeframe, TradingMode};
use crate::error::ModelError;

/// Default maintenance margin rate applied when none is supplied.
pub const DEFAULT_MAINTENANCE_MARGIN_RATE: f64 = 0.005;

/// Default taker fee rate applied when none is supplied.
pub const DEFAULT_TAKER_FEE_RATE: f64 = 0.001;

/// The maximum leverage allowed in Futures mode.
pub const MAX_FUTURES_LEVERAGE: f64 = 100.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub trading_mode: TradingMode,
    pub max_leverage: f64,
    #[serde(default = "default_maintenance_margin_rate")]
    pub maintenance_margin_rate: f64,
    #[serde(default = "default_taker_fee_rate")]
    pub taker_fee_rate: f64,
}

fn default_maintenance_margin_rate() -> f64 {
    DEFAULT_MAINTENANCE_MARGIN_RATE
}

fn default_taker_fee_rate() -> f64 {
    DEFAULT_TAKER_FEE_RATE
}

impl BacktestConfig {
    /// Builds and validates a `BacktestConfig`. `maintenance_margin_rate`
    /// and `taker_fee_rate` fall back to their documented defaults when
    /// `None`.
    ///
    /// # Errors
    /// Returns [`ModelError::Validation`] if `start_date > end_date`,
    /// `initial_capital <= 0`, `max_leverage` is out of range for the
    /// trading mode, or `maintenance_margin_rate` is not in `(0, 1)`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: Symbol,
        timeframe: Timeframe,
        start_date: NaiveDate,
        end_date: NaiveDate,
        initial_capital: f64,
        trading_mode: TradingMode,
        max_leverage: f64,
        maintenance_margin_rate: Option<f64>,
        taker_fee_rate: Option<f64>,
    ) -> Result<Self, ModelError> {
        let config = Self {
            symbol,
            timeframe,
            start_date,
            end_date,
            initial_capital,
            trading_mode,
            max_leverage,
            maintenance_margin_rate: maintenance_margin_rate
                .unwrap_or(DEFAULT_MAINTENANCE_MARGIN_RATE),
            taker_fee_rate: taker_fee_rate.unwrap_or(DEFAULT_TAKER_FEE_RATE),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.start_date > self.end_date {
            return Err(ModelError::validation(format!(
                "start_date ({}) must be <= end_date ({})",
                self.start_date, self.end_date
            )));
        }
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(ModelError::validation(format!(
                "initial_capital must be positive and finite, was {}",
                self.initial_capital
            )));
        }
        match self.trading_mode {
            TradingMode::Spot => {
                if (self.max_leverage - 1.0).abs() > f64::EPSILON {
                    return Err(ModelError::validation(
                        "max_leverage must equal 1 in Spot mode",
                    ));
                }
            }
            TradingMode::Futures => {
                if !(1.0..=MAX_FUTURES_LEVERAGE).contains(&self.max_leverage) {
                    return Err(ModelError::validation(format!(
                        "max_leverage must be in [1, {MAX_FUTURES_LEVERAGE}] in Futures mode, was {}",
                        self.max_leverage
                    )));
                }
            }
        }
        if !(self.maintenance_margin_rate > 0.0 && self.maintenance_margin_rate < 1.0) {
            return Err(ModelError::validation(format!(
                "maintenance_margin_rate must be in (0, 1), was {}",
                self.maintenance_margin_rate
            )));
        }
        if !(self.taker_fee_rate.is_finite() && self.taker_fee_rate >= 0.0) {
            return Err(ModelError::validation(format!(
                "taker_fee_rate must be non-negative and finite, was {}",
                self.taker_fee_rate
            )));
        }
        Ok(())
    }

    /// Parses and validates a `BacktestConfig` from a `config.json`
    /// document. Equivalent to [`BacktestConfig::new`]'s validation, run
    /// after deserialization.
    ///
    /// # Errors
    /// Returns [`ModelError::Serialization`] on malformed JSON, or the
    /// usual [`ModelError::Validation`] if the parsed fields are invalid.
    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| ModelError::Serialization { message: err.to_string() })?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes this config to a `config.json` document.
    ///
    /// # Errors
    /// Returns [`ModelError::Serialization`] if serialization fails (it
    /// cannot for this type, since all fields are finite or plain enums,
    /// but the fallible `serde_json` call is surfaced rather than
    /// unwrapped).
    pub fn to_json_string(&self) -> Result<String, ModelError> {
        serde_json::to_string_pretty(self)
            .map_err(|err| ModelError::Serialization { message: err.to_string() })
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
