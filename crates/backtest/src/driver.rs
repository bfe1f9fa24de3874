//! Drives one backtest run: loads the data window, then steps bar by
//! bar through liquidation scanning, the strategy callback, and snapshot
//! recording.

use btengine_core::UnixNanos;
use btengine_data::OhlcvStore;
use btengine_model::{BacktestConfig, Snapshot};
use btengine_portfolio::core::PortfolioParams;
use btengine_portfolio::{PortfolioCore, PortfolioMetrics};
use indexmap::IndexMap;
use log::{error, info};

use crate::context::Context;
use crate::error::BacktestError;
use crate::result::{BacktestResult, FinalState, RunStatus};
use crate::strategy::Strategy;

/// Owns the `OhlcvStore` and `PortfolioCore` for the duration of a run.
#[derive(Debug)]
pub struct BacktestDriver<'a> {
    store: &'a OhlcvStore,
}

impl<'a> BacktestDriver<'a> {
    #[must_use]
    pub fn new(store: &'a OhlcvStore) -> Self {
        Self { store }
    }

    /// Runs `strategy` over `config`'s window, end to end.
    ///
    /// # Errors
    /// Returns [`BacktestError::Data`] if the window fails to load (a
    /// structural or encoding failure in the underlying CSV files). Once
    /// the window is loaded, a strategy error does not propagate here:
    /// it is captured in the returned result's `status`.
    pub fn run(&self, config: &BacktestConfig, strategy: &mut dyn Strategy) -> Result<BacktestResult, BacktestError> {
        let window = self.store.load_window(
            config.symbol,
            config.timeframe,
            config.start_date,
            config.end_date,
        )?;

        let core = PortfolioCore::new(
            config.initial_capital,
            PortfolioParams {
                trading_mode: config.trading_mode,
                max_leverage: config.max_leverage,
                maintenance_margin_rate: config.maintenance_margin_rate,
                taker_fee_rate: config.taker_fee_rate,
            },
        );

        let mut context = Context::new(&core, config.symbol);

        if let Err(err) = strategy.initialize(&mut context) {
            error!("strategy initialize failed: {err}");
            return Ok(failed_result(&core, Vec::new(), Vec::new(), err));
        }

        let mut history: Vec<Snapshot> = Vec::new();

        for bar in window.iter() {
            context.current_price = bar.close;
            context.current_time = bar.timestamp;

            if let Err(err) = self.liquidate_if_needed(&context, config) {
                error!("liquidation handling failed: {err}");
                let trades = core.with_state(|state| state.trades.clone());
                return Ok(failed_result(&core, trades, history, err));
            }

            if let Err(err) = strategy.on_data(&mut context, bar) {
                error!("strategy on_data failed: {err}");
                let trades = core.with_state(|state| state.trades.clone());
                return Ok(failed_result(&core, trades, history, err));
            }

            let snapshot = self.snapshot(&core, config, bar.timestamp, bar.close);
            core.with_state(|state| state.push_snapshot(snapshot));
            history.push(snapshot);
        }

        let trades = core.with_state(|state| state.trades.clone());
        info!("run completed: {} bars, {} trades", history.len(), trades.len());

        Ok(BacktestResult {
            trades,
            history,
            final_state: final_state(&core),
            status: RunStatus::Completed,
        })
    }

    fn liquidate_if_needed(&self, context: &Context<'_>, config: &BacktestConfig) -> Result<(), BacktestError> {
        let mut prices = IndexMap::new();
        prices.insert(config.symbol, context.current_price);

        let risk_engine = context.risk_engine();
        let symbols = risk_engine.scan_liquidations(&prices);
        for symbol in symbols {
            // Fee is computed the same way an order's fee is: notional at
            // the liquidation mark times the configured taker rate.
            let fee = context.position_size().abs() * context.current_price * config.taker_fee_rate;
            risk_engine.close_at_price(symbol, context.current_price, fee, context.current_time)?;
        }
        Ok(())
    }

    fn snapshot(&self, core: &PortfolioCore, config: &BacktestConfig, timestamp: UnixNanos, mark: f64) -> Snapshot {
        let mut prices = IndexMap::new();
        prices.insert(config.symbol, mark);
        let metrics = PortfolioMetrics::new(core);
        let (cash, position_count) = core.with_state(|state| (state.cash, state.positions.len()));
        Snapshot {
            timestamp,
            portfolio_value: metrics.portfolio_value(&prices),
            cash,
            unrealised_pnl: metrics.unrealised_pnl(&prices),
            realised_pnl: metrics.realised_pnl(),
            margin_used: metrics.used_margin(),
            position_count,
            leverage_ratio: metrics.avg_leverage(),
        }
    }
}

fn final_state(core: &PortfolioCore) -> FinalState {
    core.with_state(|state| FinalState {
        cash: state.cash,
        positions: state.positions.iter().map(|(s, p)| (*s, *p)).collect(),
    })
}

fn failed_result(
    core: &PortfolioCore,
    trades: Vec<btengine_model::Trade>,
    history: Vec<Snapshot>,
    err: BacktestError,
) -> BacktestResult {
    BacktestResult {
        trades,
        history,
        final_state: final_state(core),
        status: RunStatus::Failed { message: err.to_string() },
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
