pub mod avg_win_loss;
pub mod leverage;
pub mod max_drawdown;
pub mod profit_factor;
pub mod sharpe_ratio;
pub mod sortino_ratio;
pub mod total_return;
pub mod win_rate;

pub use avg_win_loss::{AvgLoss, AvgWin};
pub use leverage::avg_and_max_leverage;
pub use max_drawdown::MaxDrawdown;
pub use profit_factor::ProfitFactor;
pub use sharpe_ratio::SharpeRatio;
pub use sortino_ratio::SortinoRatio;
pub use total_return::{TotalReturn, Volatility};
pub use win_rate::WinRate;
