//! Computes a [`BacktestMetrics`] summary from a completed run's
//! snapshot history and trade log.

use btengine_model::{Action, Snapshot, Trade};
use serde::{Deserialize, Serialize};

use crate::Returns;
use crate::statistic::PerformanceStatistic;
use crate::statistics::{
    AvgLoss, AvgWin, MaxDrawdown, ProfitFactor, SharpeRatio, SortinoRatio, TotalReturn, Volatility,
    WinRate, avg_and_max_leverage,
};

/// The full set of post-run performance statistics.
///
/// `profit_factor` may be infinite (no losing trades); serializing a run
/// with that value to JSON fails at the `serde_json` layer rather than
/// silently coercing it, since JSON has no representation for infinity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BacktestMetrics {
    pub total_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub total_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub liquidations: usize,
    pub avg_leverage: f64,
    pub max_leverage: f64,
}

impl BacktestMetrics {
    /// The all-zero/neutral result for a run with no snapshots and no
    /// trades: zero return, zero risk, `profit_factor = 0.0` (no wins).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            total_return: 0.0,
            volatility: 0.0,
            sharpe_ratio: 0.0,
            sortino_ratio: 0.0,
            max_drawdown: 0.0,
            total_trades: 0,
            win_rate: 0.0,
            profit_factor: 0.0,
            avg_win: 0.0,
            avg_loss: 0.0,
            liquidations: 0,
            avg_leverage: 0.0,
            max_leverage: 0.0,
        }
    }

    /// Serializes these metrics to a `metrics.json` document.
    ///
    /// # Errors
    /// Returns the underlying `serde_json` error if serialization fails,
    /// which it does for a run with an infinite `profit_factor` (no
    /// losing trades), since JSON has no representation for infinity.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Computes [`BacktestMetrics`] from a run's snapshot history and trade
/// log. Stateless: every call is independent, configured only by
/// `bars_per_year` (the annualisation factor for Sharpe/Sortino).
#[derive(Debug)]
pub struct MetricsCalculator {
    bars_per_year: f64,
}

impl MetricsCalculator {
    #[must_use]
    pub fn new(bars_per_year: Option<f64>) -> Self {
        Self {
            bars_per_year: bars_per_year.unwrap_or(252.0),
        }
    }

    /// Derives per-bar returns from consecutive snapshots' portfolio
    /// value. Flat (zero-valued) runs and single-snapshot runs
    /// contribute no returns.
    fn bar_returns(&self, history: &[Snapshot]) -> Returns {
        let mut returns = Returns::new();
        for window in history.windows(2) {
            let (prev, curr) = (window[0], window[1]);
            if prev.portfolio_value == 0.0 {
                continue;
            }
            let ret = (curr.portfolio_value - prev.portfolio_value) / prev.portfolio_value;
            returns.insert(curr.timestamp, ret);
        }
        returns
    }

    /// Computes the full metrics set. Returns [`BacktestMetrics::empty`]
    /// if `history` is empty.
    #[must_use]
    pub fn calculate(&self, history: &[Snapshot], trades: &[Trade], initial_capital: f64) -> BacktestMetrics {
        if history.is_empty() {
            return BacktestMetrics::empty();
        }

        let returns = self.bar_returns(history);
        let final_value = history.last().expect("checked non-empty above").portfolio_value;

        let total_return = TotalReturn::new(initial_capital).calculate(final_value);
        let volatility = Volatility::new().calculate_from_returns(&returns).unwrap_or(0.0);
        let sharpe_ratio = SharpeRatio::new(Some(self.bars_per_year))
            .calculate_from_returns(&returns)
            .unwrap_or(0.0);
        let sortino_ratio = SortinoRatio::new(Some(self.bars_per_year))
            .calculate_from_returns(&returns)
            .unwrap_or(0.0);
        let max_drawdown = MaxDrawdown::new().calculate_from_returns(&returns).unwrap_or(0.0);

        let realised_pnls: Vec<f64> = trades.iter().map(|t| t.pnl).collect();
        let win_rate = WinRate::new()
            .calculate_from_realised_pnls(&realised_pnls)
            .unwrap_or(0.0);
        let profit_factor = ProfitFactor::new()
            .calculate_from_realised_pnls(&realised_pnls)
            .unwrap_or(0.0);
        let avg_win = AvgWin::new().calculate_from_realised_pnls(&realised_pnls).unwrap_or(0.0);
        let avg_loss = AvgLoss::new()
            .calculate_from_realised_pnls(&realised_pnls)
            .unwrap_or(0.0);

        let liquidations = trades.iter().filter(|t| t.action == Action::Liquidation).count();
        let leverages: Vec<f64> = trades.iter().map(|t| t.leverage).collect();
        let (avg_leverage, max_leverage) = avg_and_max_leverage(&leverages);

        BacktestMetrics {
            total_return,
            volatility,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            total_trades: trades.len(),
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            liquidations,
            avg_leverage,
            max_leverage,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
