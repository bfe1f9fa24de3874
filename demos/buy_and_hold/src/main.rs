//! Runs end-to-end scenario 1: a Spot buy-and-hold strategy against one
//! synthetic day of hourly bars, then prints the resulting metrics.

use std::path::Path;

use btengine_analysis::MetricsCalculator;
use btengine_backtest::{BacktestDriver, BacktestError, Context, RunStatus, Strategy};
use btengine_data::OhlcvStore;
use btengine_model::{BacktestConfig, OhlcvBar, Symbol, Timeframe, TradingMode};
use chrono::NaiveDate;

/// Buys once on the first bar it sees, then holds for the rest of the run.
#[derive(Debug, Default)]
struct BuyAndHold {
    bought: bool,
}

impl Strategy for BuyAndHold {
    fn initialize(&mut self, _context: &mut Context<'_>) -> Result<(), BacktestError> {
        log::info!("buy-and-hold strategy initialized");
        Ok(())
    }

    fn on_data(&mut self, context: &mut Context<'_>, bar: &OhlcvBar) -> Result<(), BacktestError> {
        if !self.bought {
            context.buy(50.0, 1.0)?;
            self.bought = true;
            log::info!("bought 50 units at {}", bar.close);
        }
        Ok(())
    }
}

fn write_synthetic_day(root: &Path) {
    let dir = root.join("binance").join("spot").join("BTCUSDT").join("1h");
    std::fs::create_dir_all(&dir).expect("create synthetic data directory");
    let base_ts = NaiveDate::from_ymd_opt(2025, 1, 1)
        .expect("valid date")
        .and_hms_opt(0, 0, 0)
        .expect("valid time")
        .and_utc()
        .timestamp_millis() as u64;

    let mut content = String::from("timestamp,open,high,low,close,volume\n");
    for hour in 0..24u64 {
        let close = 100.0 + hour as f64 * (10.0 / 23.0);
        content.push_str(&format!(
            "{},{},{},{},{},1\n",
            base_ts + hour * 3_600_000,
            close,
            close + 1.0,
            close - 1.0,
            close
        ));
    }
    std::fs::write(dir.join("BTCUSDT_1h_2025-01-01.csv"), content).expect("write synthetic day file");
}

fn main() {
    env_logger_init();

    let tmp = tempfile::TempDir::new().expect("create temp data root");
    write_synthetic_day(tmp.path());

    let store = OhlcvStore::new(tmp.path(), "binance", TradingMode::Spot, 16, 64 * 1024 * 1024);
    let config = BacktestConfig::new(
        Symbol::new("BTCUSDT"),
        Timeframe::Hour1,
        NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date"),
        NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date"),
        10_000.0,
        TradingMode::Spot,
        1.0,
        None,
        Some(0.0),
    )
    .expect("valid config");

    let config_path = tmp.path().join("config.json");
    std::fs::write(&config_path, config.to_json_string().expect("serialize config"))
        .expect("write config.json");
    let loaded = std::fs::read_to_string(&config_path).expect("read config.json");
    let config = BacktestConfig::from_json_str(&loaded).expect("parse config.json");

    let driver = BacktestDriver::new(&store);
    let mut strategy = BuyAndHold::default();
    let result = driver.run(&config, &mut strategy).expect("window load should succeed");

    match &result.status {
        RunStatus::Completed => {
            let metrics = MetricsCalculator::new(None).calculate(&result.history, &result.trades, config.initial_capital);
            println!("trades: {}", result.trades.len());
            println!("final cash: {:.2}", result.final_state.cash);
            println!(
                "final portfolio value: {:.2}",
                result.history.last().map_or(config.initial_capital, |s| s.portfolio_value)
            );
            println!("total_return: {:.4}", metrics.total_return);
            println!("sharpe_ratio: {:.4}", metrics.sharpe_ratio);

            match metrics.to_json_string() {
                Ok(json) => {
                    let metrics_path = tmp.path().join("metrics.json");
                    std::fs::write(&metrics_path, json).expect("write metrics.json");
                    println!("wrote metrics to {}", metrics_path.display());
                }
                Err(err) => log::warn!("metrics not JSON-serializable (likely an infinite profit_factor): {err}"),
            }
        }
        RunStatus::Failed { message } => {
            eprintln!("run failed: {message}");
        }
    }
}

fn env_logger_init() {
    let _ = log::set_max_level(log::LevelFilter::Info);
}
