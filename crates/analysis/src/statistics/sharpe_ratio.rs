//! Sharpe Ratio: mean return over return stdev, annualised.

use crate::{Returns, statistic::PerformanceStatistic};

/// Computes the Sharpe Ratio, annualised by `sqrt(bars_per_year)`.
///
/// Diverges from the conventional definition in one respect: a
/// zero (or undefined, fewer than two samples) standard deviation
/// yields `0.0` rather than `NaN`, so a flat or single-bar series is a
/// well-defined "no edge" result instead of a propagating NaN.
#[derive(Debug)]
pub struct SharpeRatio {
    bars_per_year: f64,
}

impl SharpeRatio {
    #[must_use]
    pub fn new(bars_per_year: Option<f64>) -> Self {
        Self {
            bars_per_year: bars_per_year.unwrap_or(252.0),
        }
    }
}

impl PerformanceStatistic for SharpeRatio {
    type Item = f64;

    fn name(&self) -> String {
        "SharpeRatio".to_string()
    }

    fn calculate_from_returns(&self, returns: &Returns) -> Option<Self::Item> {
        if !self.check_valid_returns(returns) {
            return Some(0.0);
        }
        let mean = returns.values().sum::<f64>() / returns.len() as f64;
        let std = self.calculate_std(returns);
        if std.is_nan() || std < f64::EPSILON {
            return Some(0.0);
        }
        Some((mean / std) * self.bars_per_year.sqrt())
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

    fn returns(values: &[f64]) -> Returns {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (UnixNanos::new(i as u64), *v))
            .collect()
    }

    #[rstest]
    fn test_empty_returns_yields_zero_not_nan() {
        let stat = SharpeRatio::new(None);
        assert_eq!(stat.calculate_from_returns(&returns(&[])), Some(0.0));
    }

    #[rstest]
    fn test_constant_returns_yields_zero_not_nan() {
        let stat = SharpeRatio::new(None);
        let result = stat.calculate_from_returns(&returns(&[0.01; 10])).unwrap();
        assert_eq!(result, 0.0);
        assert!(!result.is_nan());
    }

    #[rstest]
    fn test_single_sample_yields_zero() {
        let stat = SharpeRatio::new(None);
        assert_eq!(stat.calculate_from_returns(&returns(&[0.02])), Some(0.0));
    }

    #[rstest]
    fn test_positive_mean_positive_std_yields_positive_ratio() {
        let stat = SharpeRatio::new(Some(252.0));
        let result = stat
            .calculate_from_returns(&returns(&[0.01, -0.02, 0.015, -0.005, 0.025]))
            .unwrap();
        assert!(result > 0.0);
    }
}
