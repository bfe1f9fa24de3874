//! Finite enumerations and the market-identifier type.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumString};
use ustr::Ustr;

/// A trading pair identifier, e.g. `BTCUSDT`. The set of valid symbols is
/// open (discovered from the data directory), so this wraps an interned
/// string rather than a closed Rust enum.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(Ustr);

impl Symbol {
    #[must_use]
    pub fn new(code: &str) -> Self {
        Self(Ustr::from(code))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

/// Bar granularity.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, StrumDisplay, EnumString, Serialize, Deserialize,
)]
pub enum Timeframe {
    #[strum(serialize = "1m")]
    #[serde(rename = "1m")]
    Minute1,
    #[strum(serialize = "5m")]
    #[serde(rename = "5m")]
    Minute5,
    #[strum(serialize = "15m")]
    #[serde(rename = "15m")]
    Minute15,
    #[strum(serialize = "1h")]
    #[serde(rename = "1h")]
    Hour1,
    #[strum(serialize = "4h")]
    #[serde(rename = "4h")]
    Hour4,
    #[strum(serialize = "1d")]
    #[serde(rename = "1d")]
    Day1,
}

impl Timeframe {
    /// Duration of one bar, in milliseconds.
    #[must_use]
    pub const fn duration_millis(&self) -> u64 {
        match self {
            Self::Minute1 => 60_000,
            Self::Minute5 => 5 * 60_000,
            Self::Minute15 => 15 * 60_000,
            Self::Hour1 => 60 * 60_000,
            Self::Hour4 => 4 * 60 * 60_000,
            Self::Day1 => 24 * 60 * 60_000,
        }
    }
}

/// Spot (cash-settled, no leverage, no shorting) or margined Futures trading.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, StrumDisplay, EnumString, Serialize, Deserialize,
)]
pub enum TradingMode {
    Spot,
    Futures,
}

/// Direction of an open position.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, StrumDisplay, EnumString, Serialize, Deserialize,
)]
pub enum PositionType {
    Long,
    Short,
}

/// The kind of event that produced a [`crate::trade::Trade`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, StrumDisplay, EnumString, Serialize, Deserialize,
)]
pub enum Action {
    Buy,
    Sell,
    Liquidation,
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_symbol_display_round_trip() {
        let s = Symbol::new("BTCUSDT");
        assert_eq!(s.as_str(), "BTCUSDT");
        assert_eq!(s.to_string(), "BTCUSDT");
    }

    #[rstest]
    fn test_timeframe_from_str() {
        assert_eq!(Timeframe::from_str("1h").unwrap(), Timeframe::Hour1);
        assert!(Timeframe::from_str("2h").is_err());
    }

    #[rstest]
    fn test_timeframe_duration() {
        assert_eq!(Timeframe::Minute1.duration_millis(), 60_000);
        assert_eq!(Timeframe::Day1.duration_millis(), 86_400_000);
    }
}
