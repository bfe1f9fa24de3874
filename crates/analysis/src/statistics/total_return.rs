//! Total return over a run and the volatility (stdev) of its per-bar returns.

use crate::{Returns, statistic::PerformanceStatistic};

/// `(final_value - initial_capital) / initial_capital`.
#[derive(Debug)]
pub struct TotalReturn {
    initial_capital: f64,
}

impl TotalReturn {
    #[must_use]
    pub fn new(initial_capital: f64) -> Self {
        Self { initial_capital }
    }

    #[must_use]
    pub fn calculate(&self, final_value: f64) -> f64 {
        if self.initial_capital == 0.0 {
            return 0.0;
        }
        (final_value - self.initial_capital) / self.initial_capital
    }
}

/// Sample standard deviation of the per-bar returns series; `0.0` with
/// fewer than two samples.
#[derive(Debug, Default)]
pub struct Volatility;

impl Volatility {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PerformanceStatistic for Volatility {
    type Item = f64;

    fn name(&self) -> String {
        "Volatility".to_string()
    }

    fn calculate_from_returns(&self, returns: &Returns) -> Option<Self::Item> {
        let std = self.calculate_std(returns);
        Some(if std.is_nan() { 0.0 } else { std })
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use btengine_core::UnixNanos;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_total_return_positive() {
        let stat = TotalReturn::new(10_000.0);
        assert_eq!(stat.calculate(15_000.0), 0.5);
    }

    #[rstest]
    fn test_total_return_zero_capital_is_zero() {
        let stat = TotalReturn::new(0.0);
        assert_eq!(stat.calculate(100.0), 0.0);
    }

    #[rstest]
    fn test_volatility_empty_is_zero_not_nan() {
        let stat = Volatility::new();
        let returns: Returns = Returns::new();
        assert_eq!(stat.calculate_from_returns(&returns), Some(0.0));
    }

    #[rstest]
    fn test_volatility_nonzero_with_varying_returns() {
        let stat = Volatility::new();
        let returns: Returns = [(UnixNanos::new(0), 0.01), (UnixNanos::new(1), -0.02)]
            .into_iter()
            .collect();
        let result = stat.calculate_from_returns(&returns).unwrap();
        assert!(result > 0.0);
    }
}
