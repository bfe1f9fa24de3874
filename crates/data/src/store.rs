//! The OHLCV data-access layer: per-day CSV loading, validation, LRU
//! result caching, and observer dispatch.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use btengine_model::{CacheKey, OhlcvBar, OhlcvWindow, Symbol, Timeframe, TradingMode};
use chrono::{Datelike, NaiveDate};

use crate::error::DataError;
use crate::lru::LruCache;
use crate::memory::MemoryTracker;
use crate::observer::{CacheEvent, CacheObserver, CacheStatistics, Counters, NotificationCenter, ObserverId};
use crate::stat_cache::FileStatCache;

const EXPECTED_HEADER: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

/// Eviction retries attempted before refusing to cache an entry under
/// memory pressure.
const EVICTION_RETRY_CAP: usize = 3;

struct CacheEntry {
    frame: Arc<OhlcvWindow>,
    bytes: u64,
}

struct CacheState {
    lru: LruCache<CacheKey, CacheEntry>,
}

/// Loads, validates, and caches per-day OHLCV CSV files from a directory
/// layout of `<data_root>/<venue>/<spot|futures>/<SYMBOL>/<TIMEFRAME>/
/// <SYMBOL>_<TIMEFRAME>_<YYYY-MM-DD>.csv`.
///
/// Thread-safe: shareable across concurrent backtests. Holds two
/// distinct locks (cache/state, and notifications) that are never held
/// together across an observer dispatch, per the engine's concurrency
/// model.
pub struct OhlcvStore {
    data_root: PathBuf,
    venue: String,
    trading_mode: TradingMode,
    stat_cache: FileStatCache,
    state: Mutex<CacheState>,
    memory: MemoryTracker,
    notifications: NotificationCenter,
    counters: Counters,
}

impl std::fmt::Debug for OhlcvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OhlcvStore")
            .field("data_root", &self.data_root)
            .field("venue", &self.venue)
            .field("trading_mode", &self.trading_mode)
            .finish_non_exhaustive()
    }
}

impl OhlcvStore {
    #[must_use]
    pub fn new(
        data_root: impl Into<PathBuf>,
        venue: impl Into<String>,
        trading_mode: TradingMode,
        cache_capacity: usize,
        memory_ceiling_bytes: u64,
    ) -> Self {
        Self {
            data_root: data_root.into(),
            venue: venue.into(),
            trading_mode,
            stat_cache: FileStatCache::new(),
            state: Mutex::new(CacheState {
                lru: LruCache::new(cache_capacity),
            }),
            memory: MemoryTracker::new(memory_ceiling_bytes),
            notifications: NotificationCenter::default(),
            counters: Counters::default(),
        }
    }

    fn mode_segment(&self) -> &'static str {
        match self.trading_mode {
            TradingMode::Spot => "spot",
            TradingMode::Futures => "futures",
        }
    }

    fn symbol_dir(&self, symbol: Symbol) -> PathBuf {
        self.data_root
            .join(&self.venue)
            .join(self.mode_segment())
            .join(symbol.as_str())
    }

    fn day_path(&self, symbol: Symbol, timeframe: Timeframe, date: NaiveDate) -> PathBuf {
        self.symbol_dir(symbol).join(timeframe.to_string()).join(format!(
            "{}_{}_{:04}-{:02}-{:02}.csv",
            symbol.as_str(),
            timeframe,
            date.year(),
            date.month(),
            date.day()
        ))
    }

    /// Loads and returns the per-day OHLCV frame for `date`. A missing
    /// file returns an empty window (tolerated, not an error).
    ///
    /// # Errors
    /// Returns [`DataError`] on a structural or encoding failure in an
    /// existing file.
    pub fn load_day(
        &self,
        symbol: Symbol,
        timeframe: Timeframe,
        date: NaiveDate,
    ) -> Result<Arc<OhlcvWindow>, DataError> {
        let path = self.day_path(symbol, timeframe, date);
        if !path.exists() {
            return Ok(Arc::new(OhlcvWindow::default()));
        }

        let mtime = self.stat_cache.get_mtime(&path)?;
        let key = CacheKey::new(path.clone(), mtime);

        {
            let mut state = self.state.lock().expect("cache state lock poisoned");
            if let Some(entry) = state.lru.get(&key) {
                let frame = entry.frame.clone();
                self.enqueue(CacheEvent::Hit { key });
                drop(state);
                self.notifications.drain();
                return Ok(frame);
            }
        }

        let frame = Arc::new(load_day_file(&path)?);
        let bytes = MemoryTracker::estimate_frame_bytes(frame.len());

        let mut state = self.state.lock().expect("cache state lock poisoned");
        let mut retries = 0;
        while self.memory.would_exceed(bytes) && retries < EVICTION_RETRY_CAP {
            match state.lru.evict_lru() {
                Some((evicted_key, evicted_entry)) => {
                    self.memory.record_evict(evicted_entry.bytes);
                    self.enqueue(CacheEvent::Evict { key: evicted_key });
                }
                None => break,
            }
            retries += 1;
        }

        if self.memory.would_exceed(bytes) {
            drop(state);
            self.enqueue(CacheEvent::OverCapacity { path: path.clone() });
            self.notifications.drain();
            return Ok(frame);
        }

        state.lru.insert(key.clone(), CacheEntry { frame: frame.clone(), bytes });
        self.memory.record_insert(bytes);
        self.enqueue(CacheEvent::Miss { key });
        drop(state);
        self.notifications.drain();

        Ok(frame)
    }

    /// Records the event's counters and appends it to the deferred
    /// dispatch queue. Does not dispatch: callers drain only after
    /// releasing the cache/state lock, so observer callbacks never run
    /// while it is held.
    fn enqueue(&self, event: CacheEvent) {
        self.counters.record(&event);
        self.notifications.enqueue(event);
    }

    /// Loads the contiguous window `[start, end]`, concatenating and
    /// deduplicating per-day frames (last-wins across day boundaries).
    ///
    /// # Errors
    /// Returns [`DataError`] if any day within the range fails
    /// structurally; missing days are tolerated.
    pub fn load_window(
        &self,
        symbol: Symbol,
        timeframe: Timeframe,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<OhlcvWindow, DataError> {
        let mut window = OhlcvWindow::default();
        let mut date = start;
        while date <= end {
            let day = self.load_day(symbol, timeframe, date)?;
            window = window.concat((*day).clone());
            date = date.succ_opt().expect("date arithmetic does not overflow");
        }

        let start_ts = btengine_core::UnixNanos::from_millis(
            start
                .and_hms_opt(0, 0, 0)
                .expect("valid time")
                .and_utc()
                .timestamp_millis() as u64,
        );
        let end_ts = btengine_core::UnixNanos::from_millis(
            end.and_hms_milli_opt(23, 59, 59, 999)
                .expect("valid time")
                .and_utc()
                .timestamp_millis() as u64,
        );
        Ok(window.filter_range(start_ts, end_ts))
    }

    /// Lists symbol directories under this store's venue/mode root.
    ///
    /// # Errors
    /// Returns [`DataError::FileSystem`] if the root cannot be read.
    pub fn discover_symbols(&self) -> Result<Vec<String>, DataError> {
        let root = self.data_root.join(&self.venue).join(self.mode_segment());
        list_dir_names(&root)
    }

    /// Lists timeframe directories available for `symbol`.
    ///
    /// # Errors
    /// Returns [`DataError::FileSystem`] if the symbol directory cannot
    /// be read.
    pub fn discover_timeframes(&self, symbol: Symbol) -> Result<Vec<String>, DataError> {
        list_dir_names(&self.symbol_dir(symbol))
    }

    #[must_use]
    pub fn subscribe(&self, observer: Arc<dyn CacheObserver>) -> ObserverId {
        self.notifications.subscribe(observer)
    }

    pub fn unsubscribe(&self, id: ObserverId) {
        self.notifications.unsubscribe(id);
    }

    #[must_use]
    pub fn cache_statistics(&self) -> CacheStatistics {
        let entries = self
            .state
            .lock()
            .expect("cache state lock poisoned")
            .lru
            .len() as u64;
        self.counters.snapshot(entries)
    }
}

fn list_dir_names(root: &Path) -> Result<Vec<String>, DataError> {
    if !root.exists() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(root).map_err(|err| DataError::FileSystem {
        path: root.to_path_buf(),
        message: err.to_string(),
    })?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| DataError::FileSystem {
            path: root.to_path_buf(),
            message: err.to_string(),
        })?;
        if entry.path().is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

fn load_day_file(path: &Path) -> Result<OhlcvWindow, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|err| DataError::FileSystem {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

    let header = reader.headers().map_err(|err| DataError::Structure {
        path: path.to_path_buf(),
        message: format!("failed to read header: {err}"),
    })?;
    if header.iter().collect::<Vec<_>>() != EXPECTED_HEADER.to_vec() {
        return Err(DataError::Structure {
            path: path.to_path_buf(),
            message: format!(
                "expected header `{}`, found `{}`",
                EXPECTED_HEADER.join(","),
                header.iter().collect::<Vec<_>>().join(",")
            ),
        });
    }

    let mut bars = Vec::new();
    for (row_index, record) in reader.records().enumerate() {
        let record = record.map_err(|err| csv_row_error(path, row_index, &err))?;
        let bar = parse_row(path, row_index, &record)?;
        bars.push(bar);
    }

    Ok(OhlcvWindow::from_bars(bars))
}

/// Classifies a row-level CSV error as an encoding failure (non-UTF-8
/// bytes) or a generic parse failure.
fn csv_row_error(path: &Path, row_index: usize, err: &csv::Error) -> DataError {
    if matches!(err.kind(), csv::ErrorKind::Utf8 { .. }) {
        DataError::Encoding {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    } else {
        DataError::Parse {
            path: path.to_path_buf(),
            row: Some(row_index),
            message: err.to_string(),
        }
    }
}

fn parse_row(path: &Path, row_index: usize, record: &csv::StringRecord) -> Result<OhlcvBar, DataError> {
    let field = |index: usize, name: &str| -> Result<&str, DataError> {
        record.get(index).ok_or_else(|| DataError::Parse {
            path: path.to_path_buf(),
            row: Some(row_index),
            message: format!("missing field `{name}`"),
        })
    };
    let parse_f64 = |raw: &str, name: &str| -> Result<f64, DataError> {
        raw.trim().parse::<f64>().map_err(|err| DataError::Parse {
            path: path.to_path_buf(),
            row: Some(row_index),
            message: format!("invalid `{name}` value `{raw}`: {err}"),
        })
    };
    let parse_u64 = |raw: &str, name: &str| -> Result<u64, DataError> {
        raw.trim().parse::<u64>().map_err(|err| DataError::Parse {
            path: path.to_path_buf(),
            row: Some(row_index),
            message: format!("invalid `{name}` value `{raw}`: {err}"),
        })
    };

    let timestamp = parse_u64(field(0, "timestamp")?, "timestamp")?;
    let open = parse_f64(field(1, "open")?, "open")?;
    let high = parse_f64(field(2, "high")?, "high")?;
    let low = parse_f64(field(3, "low")?, "low")?;
    let close = parse_f64(field(4, "close")?, "close")?;
    let volume = parse_f64(field(5, "volume")?, "volume")?;

    OhlcvBar::new(timestamp, open, high, low, close, volume).map_err(|err| DataError::Structure {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    fn write_day_file(root: &Path, symbol: &str, timeframe: &str, date: &str, rows: &[&str]) {
        let dir = root.join("binance").join("spot").join(symbol).join(timeframe);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{symbol}_{timeframe}_{date}.csv"));
        let mut content = String::from("timestamp,open,high,low,close,volume\n");
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        std::fs::write(path, content).unwrap();
    }

    struct CountingObserver {
        count: StdMutex<usize>,
    }

    impl CacheObserver for CountingObserver {
        fn on_event(&self, _event: &CacheEvent) {
            *self.count.lock().unwrap() += 1;
        }
    }

    #[rstest]
    fn test_missing_day_is_empty_not_error() {
        let tmp = TempDir::new().unwrap();
        let store = OhlcvStore::new(tmp.path(), "binance", TradingMode::Spot, 10, 1_000_000);
        let result = store.load_day(Symbol::new("BTCUSDT"), Timeframe::Hour1, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!(result.unwrap().is_empty());
    }

    #[rstest]
    fn test_load_day_then_cache_hit() {
        let tmp = TempDir::new().unwrap();
        write_day_file(
            tmp.path(),
            "BTCUSDT",
            "1h",
            "2025-01-01",
            &["1735689600000,100,101,99,100.5,10"],
        );
        let store = OhlcvStore::new(tmp.path(), "binance", TradingMode::Spot, 10, 1_000_000);
        let symbol = Symbol::new("BTCUSDT");
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

        let first = store.load_day(symbol, Timeframe::Hour1, date).unwrap();
        let second = store.load_day(symbol, Timeframe::Hour1, date).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);

        let stats = store.cache_statistics();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[rstest]
    fn test_bad_header_is_structure_error() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("binance").join("spot").join("BTCUSDT").join("1h");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("BTCUSDT_1h_2025-01-01.csv"),
            "time,open,high,low,close,volume\n1,1,1,1,1,1\n",
        )
        .unwrap();
        let store = OhlcvStore::new(tmp.path(), "binance", TradingMode::Spot, 10, 1_000_000);
        let result = store.load_day(
            Symbol::new("BTCUSDT"),
            Timeframe::Hour1,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        );
        assert!(matches!(result, Err(DataError::Structure { .. })));
    }

    #[rstest]
    fn test_empty_file_is_empty_not_error() {
        let tmp = TempDir::new().unwrap();
        write_day_file(tmp.path(), "BTCUSDT", "1h", "2025-01-01", &[]);
        let store = OhlcvStore::new(tmp.path(), "binance", TradingMode::Spot, 10, 1_000_000);
        let result = store.load_day(
            Symbol::new("BTCUSDT"),
            Timeframe::Hour1,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        );
        assert!(result.unwrap().is_empty());
    }

    #[rstest]
    fn test_observer_sees_miss_then_hit() {
        let tmp = TempDir::new().unwrap();
        write_day_file(
            tmp.path(),
            "BTCUSDT",
            "1h",
            "2025-01-01",
            &["1735689600000,100,101,99,100.5,10"],
        );
        let store = OhlcvStore::new(tmp.path(), "binance", TradingMode::Spot, 10, 1_000_000);
        let observer = Arc::new(CountingObserver {
            count: StdMutex::new(0),
        });
        store.subscribe(observer.clone());

        let symbol = Symbol::new("BTCUSDT");
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        store.load_day(symbol, Timeframe::Hour1, date).unwrap();
        store.load_day(symbol, Timeframe::Hour1, date).unwrap();

        assert_eq!(*observer.count.lock().unwrap(), 2);
    }

    #[rstest]
    fn test_discover_symbols() {
        let tmp = TempDir::new().unwrap();
        write_day_file(tmp.path(), "BTCUSDT", "1h", "2025-01-01", &[]);
        write_day_file(tmp.path(), "ETHUSDT", "1h", "2025-01-01", &[]);
        let store = OhlcvStore::new(tmp.path(), "binance", TradingMode::Spot, 10, 1_000_000);
        let symbols = store.discover_symbols().unwrap();
        assert_eq!(symbols, vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]);
    }
}
