//! The portfolio engine's error taxonomy.

use btengine_model::{ModelError, Symbol};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PortfolioError {
    #[error("validation error: {0}")]
    Validation(#[from] ModelError),

    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("position not found: {symbol}")]
    PositionNotFound { symbol: Symbol },
}
