//! The cache key used by the data-access layer: a file path paired with
//! its modification time. Any change in mtime produces a distinct key, so
//! stale entries are never served.

use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: PathBuf,
    pub mtime_secs: u64,
}

impl CacheKey {
    #[must_use]
    pub fn new(path: PathBuf, mtime_secs: u64) -> Self {
        Self { path, mtime_secs }
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
    fn test_distinct_mtime_distinct_key() {
        let a = CacheKey::new(PathBuf::from("/data/x.csv"), 100);
        let b = CacheKey::new(PathBuf::from("/data/x.csv"), 200);
        assert_ne!(a, b);
    }

    #[rstest]
    fn test_same_path_and_mtime_equal_key() {
        let a = CacheKey::new(PathBuf::from("/data/x.csv"), 100);
        let b = CacheKey::new(PathBuf::from("/data/x.csv"), 100);
        assert_eq!(a, b);
    }
}
