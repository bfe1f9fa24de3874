//! Sortino Ratio: mean return over downside-only return stdev, annualised.

use crate::{Returns, statistic::PerformanceStatistic};

/// Like [`crate::statistics::sharpe_ratio::SharpeRatio`] but penalises
/// only downside volatility. Returns `0.0` on an empty series or when
/// there are no downside bars, rather than `NaN`.
#[derive(Debug)]
pub struct SortinoRatio {
    bars_per_year: f64,
}

impl SortinoRatio {
    #[must_use]
    pub fn new(bars_per_year: Option<f64>) -> Self {
        Self {
            bars_per_year: bars_per_year.unwrap_or(252.0),
        }
    }
}

impl PerformanceStatistic for SortinoRatio {
    type Item = f64;

    fn name(&self) -> String {
        "SortinoRatio".to_string()
    }

    fn calculate_from_returns(&self, returns: &Returns) -> Option<Self::Item> {
        if !self.check_valid_returns(returns) {
            return Some(0.0);
        }
        let mean = returns.values().sum::<f64>() / returns.len() as f64;
        let downside = self.calculate_downside_std(returns);
        if downside.is_nan() || downside < f64::EPSILON {
            return Some(0.0);
        }
        Some((mean / downside) * self.bars_per_year.sqrt())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
