//! A UTC instant represented as nanoseconds since the Unix epoch.

use std::fmt::Display;
use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Nanoseconds-since-epoch timestamp, used as the canonical time type
/// throughout the engine. Market data on disk is millisecond-granular;
/// conversion helpers are provided at that boundary.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnixNanos(u64);

impl UnixNanos {
    pub const ONE_DAY: u64 = 86_400_000_000_000;
    pub const ONE_MILLISECOND: u64 = 1_000_000;

    #[must_use]
    pub const fn new(nanos: u64) -> Self {
        Self(nanos)
    }

    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(Self::ONE_MILLISECOND))
    }

    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0 / Self::ONE_MILLISECOND
    }

    #[must_use]
    pub const fn as_f64(&self) -> f64 {
        self.0 as f64
    }

    #[must_use]
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.0 as i64)
    }
}

impl From<u64> for UnixNanos {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Deref for UnixNanos {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq<u64> for UnixNanos {
    fn eq(&self, other: &u64) -> bool {
        self.0 == *other
    }
}

impl PartialOrd<u64> for UnixNanos {
    fn partial_cmp(&self, other: &u64) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(other)
    }
}

impl Display for UnixNanos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
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
    fn test_from_millis_round_trip() {
        let ts = UnixNanos::from_millis(1_700_000_000_123);
        assert_eq!(ts.as_millis(), 1_700_000_000_123);
    }

    #[rstest]
    fn test_ordering() {
        let a = UnixNanos::new(100);
        let b = UnixNanos::new(200);
        assert!(a < b);
        assert_eq!(a, 100u64);
    }

    #[rstest]
    fn test_one_day_constant() {
        assert_eq!(UnixNanos::ONE_DAY, 86_400_000_000_000);
    }
}
