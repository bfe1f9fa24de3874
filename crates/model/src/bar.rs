//! OHLCV bars and the ordered window materialized from them.

use btengine_core::UnixNanos;
use btengine_core::correctness::{check_finite, check_non_negative, check_positive};

use crate::error::ModelError;

/// A single OHLCV sample. `timestamp` is millisecond-granular UTC.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OhlcvBar {
    pub timestamp: UnixNanos,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// Constructs a bar, validating the OHLC invariants and finiteness.
    ///
    /// # Errors
    /// Returns [`ModelError::Validation`] if any price is non-positive or
    /// non-finite, volume is negative, or `low <= open,close <= high` does
    /// not hold.
    pub fn new(
        timestamp_millis: u64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, ModelError> {
        check_positive(open, "open").map_err(ModelError::from)?;
        check_positive(high, "high").map_err(ModelError::from)?;
        check_positive(low, "low").map_err(ModelError::from)?;
        check_positive(close, "close").map_err(ModelError::from)?;
        check_non_negative(volume, "volume").map_err(ModelError::from)?;
        check_finite(volume, "volume").map_err(ModelError::from)?;

        if low > high {
            return Err(ModelError::validation(format!(
                "low ({low}) must be <= high ({high})"
            )));
        }
        if open < low || open > high {
            return Err(ModelError::validation(format!(
                "open ({open}) must be within [low, high] = [{low}, {high}]"
            )));
        }
        if close < low || close > high {
            return Err(ModelError::validation(format!(
                "close ({close}) must be within [low, high] = [{low}, {high}]"
            )));
        }

        Ok(Self {
            timestamp: UnixNanos::from_millis(timestamp_millis),
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// An ordered sequence of [`OhlcvBar`] for a single symbol/timeframe over
/// `[start, end]`. Timestamps are strictly increasing once constructed via
/// [`OhlcvWindow::from_bars`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OhlcvWindow {
    bars: Vec<OhlcvBar>,
}

impl OhlcvWindow {
    /// Builds a window from an unordered, possibly duplicate-timestamped
    /// set of bars: sorts by timestamp, then deduplicates by timestamp
    /// keeping the later-occurring (in input order) entry for ties.
    #[must_use]
    pub fn from_bars(mut bars: Vec<OhlcvBar>) -> Self {
        // Stable sort preserves input order among equal timestamps, so a
        // subsequent "keep last" dedup pass implements last-wins.
        bars.sort_by_key(|b| b.timestamp);

        let mut deduped: Vec<OhlcvBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            if let Some(last) = deduped.last_mut() {
                if last.timestamp == bar.timestamp {
                    *last = bar;
                    continue;
                }
            }
            deduped.push(bar);
        }

        Self { bars: deduped }
    }

    /// Filters to bars with `start <= timestamp <= end` (millisecond
    /// resolution), preserving order.
    #[must_use]
    pub fn filter_range(self, start: UnixNanos, end: UnixNanos) -> Self {
        let bars = self
            .bars
            .into_iter()
            .filter(|b| b.timestamp >= *start && b.timestamp <= *end)
            .collect();
        Self { bars }
    }

    #[must_use]
    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OhlcvBar> {
        self.bars.iter()
    }

    /// Concatenates two windows (e.g. consecutive per-day frames), then
    /// re-sorts and deduplicates, applying last-wins across the boundary.
    #[must_use]
    pub fn concat(mut self, other: Self) -> Self {
        self.bars.extend(other.bars);
        Self::from_bars(self.bars)
    }
}

impl IntoIterator for OhlcvWindow {
    type Item = OhlcvBar;
    type IntoIter = std::vec::IntoIter<OhlcvBar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.into_iter()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
