//! Average winning and average losing trade PnL.

use crate::statistic::PerformanceStatistic;

/// Mean of strictly positive realised PnLs; `0.0` if there are none.
#[derive(Debug, Default)]
pub struct AvgWin;

impl AvgWin {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PerformanceStatistic for AvgWin {
    type Item = f64;

    fn name(&self) -> String {
        "AvgWin".to_string()
    }

    fn calculate_from_realised_pnls(&self, realised_pnls: &[f64]) -> Option<Self::Item> {
        let wins: Vec<f64> = realised_pnls.iter().copied().filter(|&p| p > 0.0).collect();
        if wins.is_empty() {
            return Some(0.0);
        }
        Some(wins.iter().sum::<f64>() / wins.len() as f64)
    }
}

/// Mean of strictly negative realised PnLs; `0.0` if there are none.
#[derive(Debug, Default)]
pub struct AvgLoss;

impl AvgLoss {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PerformanceStatistic for AvgLoss {
    type Item = f64;

    fn name(&self) -> String {
        "AvgLoss".to_string()
    }

    fn calculate_from_realised_pnls(&self, realised_pnls: &[f64]) -> Option<Self::Item> {
        let losses: Vec<f64> = realised_pnls.iter().copied().filter(|&p| p < 0.0).collect();
        if losses.is_empty() {
            return Some(0.0);
        }
        Some(losses.iter().sum::<f64>() / losses.len() as f64)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
