//! Profit Factor: gross wins over gross losses, from realised PnLs.

use crate::statistic::PerformanceStatistic;

/// Diverges from the conventional definition at both degenerate ends:
/// `+∞` with no losses (rather than `NaN`), `0.0` with no wins.
#[derive(Debug, Default)]
pub struct ProfitFactor;

impl ProfitFactor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PerformanceStatistic for ProfitFactor {
    type Item = f64;

    fn name(&self) -> String {
        "ProfitFactor".to_string()
    }

    fn calculate_from_realised_pnls(&self, realised_pnls: &[f64]) -> Option<Self::Item> {
        let (gross_win, gross_loss) = realised_pnls.iter().fold((0.0, 0.0), |(win, loss), &pnl| {
            if pnl >= 0.0 {
                (win + pnl, loss)
            } else {
                (win, loss + pnl)
            }
        });

        if gross_loss == 0.0 {
            return Some(if gross_win > 0.0 { f64::INFINITY } else { 0.0 });
        }
        Some((gross_win / gross_loss).abs())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_empty_pnls_is_zero() {
        let stat = ProfitFactor::new();
        assert_eq!(stat.calculate_from_realised_pnls(&[]), Some(0.0));
    }

    #[rstest]
    fn test_no_losses_is_infinite_not_nan() {
        let stat = ProfitFactor::new();
        let result = stat.calculate_from_realised_pnls(&[10.0, 20.0, 30.0]).unwrap();
        assert!(result.is_infinite() && result > 0.0);
    }

    #[rstest]
    fn test_no_wins_is_zero() {
        let stat = ProfitFactor::new();
        let result = stat
            .calculate_from_realised_pnls(&[-10.0, -20.0, -30.0])
            .unwrap();
        assert_eq!(result, 0.0);
    }

    #[rstest]
    fn test_mixed_pnls() {
        let stat = ProfitFactor::new();
        let result = stat
            .calculate_from_realised_pnls(&[10.0, -20.0, 30.0, -40.0])
            .unwrap();
        assert_eq!(result, 40.0 / 60.0);
    }

    #[rstest]
    fn test_equal_wins_and_losses_is_one() {
        let stat = ProfitFactor::new();
        let result = stat.calculate_from_realised_pnls(&[20.0, -20.0]).unwrap();
        assert_eq!(result, 1.0);
    }
}
