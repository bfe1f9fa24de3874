//! The driver's error taxonomy: everything that can abort a run.

use btengine_data::DataError;
use btengine_portfolio::PortfolioError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BacktestError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Portfolio(#[from] PortfolioError),

    #[error("strategy error: {0}")]
    Strategy(String),
}
