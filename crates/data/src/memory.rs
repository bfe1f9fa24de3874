//! Tracks approximate in-cache byte usage and enforces a memory ceiling.

use std::sync::atomic::{AtomicU64, Ordering};

/// Estimates cumulative cached-frame bytes and enforces a configurable
/// ceiling. Sizes are approximate; absolute precision is unnecessary, so
/// a simple atomic counter suffices rather than tracking individual
/// allocations.
#[derive(Debug)]
pub struct MemoryTracker {
    ceiling_bytes: u64,
    usage_bytes: AtomicU64,
}

impl MemoryTracker {
    #[must_use]
    pub fn new(ceiling_bytes: u64) -> Self {
        Self {
            ceiling_bytes,
            usage_bytes: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn usage(&self) -> u64 {
        self.usage_bytes.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn ceiling(&self) -> u64 {
        self.ceiling_bytes
    }

    /// True if adding `additional_bytes` to current usage would exceed
    /// the ceiling.
    #[must_use]
    pub fn would_exceed(&self, additional_bytes: u64) -> bool {
        self.usage() + additional_bytes > self.ceiling_bytes
    }

    pub fn record_insert(&self, bytes: u64) {
        self.usage_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_evict(&self, bytes: u64) {
        self.usage_bytes
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_sub(bytes))
            })
            .ok();
    }

    /// Approximates a cached frame's byte cost: six `f64`/`u64` fields per
    /// bar plus a fixed per-entry overhead for bookkeeping structures.
    #[must_use]
    pub fn estimate_frame_bytes(bar_count: usize) -> u64 {
        const BYTES_PER_BAR: u64 = 6 * 8;
        const ENTRY_OVERHEAD: u64 = 128;
        bar_count as u64 * BYTES_PER_BAR + ENTRY_OVERHEAD
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
    fn test_would_exceed() {
        let tracker = MemoryTracker::new(1000);
        tracker.record_insert(900);
        assert!(tracker.would_exceed(200));
        assert!(!tracker.would_exceed(50));
    }

    #[rstest]
    fn test_record_evict_decrements_usage() {
        let tracker = MemoryTracker::new(1000);
        tracker.record_insert(500);
        tracker.record_evict(200);
        assert_eq!(tracker.usage(), 300);
    }

    #[rstest]
    fn test_record_evict_never_underflows() {
        let tracker = MemoryTracker::new(1000);
        tracker.record_evict(200);
        assert_eq!(tracker.usage(), 0);
    }
}
