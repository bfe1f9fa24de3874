//! Short-TTL cache of file modification timestamps, so repeated cache-key
//! computation doesn't re-stat every file on every lookup.

use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::DataError;
use crate::lru::LruCache;

/// Time-to-live for a cached mtime entry.
pub const STAT_TTL: Duration = Duration::from_secs(300);

/// Maximum number of cached entries.
pub const STAT_CAPACITY: usize = 1_000;

struct Entry {
    mtime_secs: u64,
    cached_at: Instant,
}

/// Caches file-modification timestamps with a TTL and an LRU capacity
/// bound. Its internal lock nests strictly inside
/// [`crate::store::OhlcvStore`]'s cache lock: this type never acquires
/// any lock of its caller, so the nesting order is always consistent.
pub struct FileStatCache {
    inner: Mutex<LruCache<std::path::PathBuf, Entry>>,
}

impl std::fmt::Debug for FileStatCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStatCache").finish_non_exhaustive()
    }
}

impl Default for FileStatCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FileStatCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LruCache::new(STAT_CAPACITY)),
        }
    }

    /// Returns the file's modification time, in seconds since the Unix
    /// epoch, served from cache when fresh or freshly stat'd otherwise.
    ///
    /// # Errors
    /// Returns [`DataError::FileSystem`] if the underlying `stat` call
    /// fails (e.g. the file does not exist).
    pub fn get_mtime(&self, path: &Path) -> Result<u64, DataError> {
        let mut guard = self.inner.lock().expect("stat cache lock poisoned");
        if let Some(entry) = guard.get(&path.to_path_buf()) {
            if entry.cached_at.elapsed() < STAT_TTL {
                return Ok(entry.mtime_secs);
            }
        }
        drop(guard);

        let mtime_secs = stat_mtime_secs(path)?;
        let mut guard = self.inner.lock().expect("stat cache lock poisoned");
        guard.insert(
            path.to_path_buf(),
            Entry {
                mtime_secs,
                cached_at: Instant::now(),
            },
        );
        Ok(mtime_secs)
    }
}

fn stat_mtime_secs(path: &Path) -> Result<u64, DataError> {
    let metadata = std::fs::metadata(path).map_err(|err| DataError::FileSystem {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    let modified = metadata.modified().map_err(|err| DataError::FileSystem {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    let secs = modified
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|err| DataError::FileSystem {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?
        .as_secs();
    Ok(secs)
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tempfile::NamedTempFile;

    use super::*;

    #[rstest]
    fn test_get_mtime_for_existing_file() {
        let file = NamedTempFile::new().unwrap();
        let cache = FileStatCache::new();
        let mtime = cache.get_mtime(file.path());
        assert!(mtime.is_ok());
    }

    #[rstest]
    fn test_get_mtime_caches_result() {
        let file = NamedTempFile::new().unwrap();
        let cache = FileStatCache::new();
        let first = cache.get_mtime(file.path()).unwrap();
        let second = cache.get_mtime(file.path()).unwrap();
        assert_eq!(first, second);
    }

    #[rstest]
    fn test_get_mtime_missing_file_errors() {
        let cache = FileStatCache::new();
        let result = cache.get_mtime(std::path::Path::new("/nonexistent/path/file.csv"));
        assert!(matches!(result, Err(DataError::FileSystem { .. })));
    }
}
