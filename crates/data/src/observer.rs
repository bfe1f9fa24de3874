//! Cache-event observer hook, dispatched via a deferred queue.
//!
//! Cache mutations only enqueue events while the cache lock is held; a
//! separate lock governs draining the queue and dispatching to
//! observers. This separation avoids re-entrant deadlock when an
//! observer itself queries the store.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use btengine_model::CacheKey;

/// An event published by [`crate::store::OhlcvStore`] as its cache is
/// read from or written to.
#[derive(Clone, Debug)]
pub enum CacheEvent {
    Hit { key: CacheKey },
    Miss { key: CacheKey },
    Evict { key: CacheKey },
    /// Eviction could not free enough space within the retry budget; the
    /// entry was not cached but was still returned to the caller.
    OverCapacity { path: PathBuf },
}

/// A sink for cache events. Implementations must tolerate being invoked
/// on arbitrary threads and should be side-effect-lean.
pub trait CacheObserver: Send + Sync {
    fn on_event(&self, event: &CacheEvent);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Running counters for cache activity, exposed read-only via
/// [`crate::store::OhlcvStore::cache_statistics`].
#[derive(Debug, Default)]
pub struct CacheStatistics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl Counters {
    pub(crate) fn record(&self, event: &CacheEvent) {
        match event {
            CacheEvent::Hit { .. } => self.hits.fetch_add(1, Ordering::Relaxed),
            CacheEvent::Miss { .. } => self.misses.fetch_add(1, Ordering::Relaxed),
            CacheEvent::Evict { .. } => self.evictions.fetch_add(1, Ordering::Relaxed),
            CacheEvent::OverCapacity { .. } => return,
        };
    }

    pub(crate) fn snapshot(&self, entries: u64) -> CacheStatistics {
        CacheStatistics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries,
        }
    }
}

/// The deferred event queue and observer registry. Its internal lock is
/// distinct from, and never held together with, the cache's own lock.
#[derive(Default)]
pub(crate) struct NotificationCenter {
    queue: Mutex<Vec<CacheEvent>>,
    observers: Mutex<Vec<(ObserverId, Arc<dyn CacheObserver>)>>,
    next_id: AtomicU64,
}

impl NotificationCenter {
    pub(crate) fn subscribe(&self, observer: Arc<dyn CacheObserver>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers
            .lock()
            .expect("notification observers lock poisoned")
            .push((id, observer));
        id
    }

    pub(crate) fn unsubscribe(&self, id: ObserverId) {
        self.observers
            .lock()
            .expect("notification observers lock poisoned")
            .retain(|(existing, _)| *existing != id);
    }

    /// Appends an event to the queue. Called while the cache lock is
    /// held; does not dispatch.
    pub(crate) fn enqueue(&self, event: CacheEvent) {
        self.queue
            .lock()
            .expect("notification queue lock poisoned")
            .push(event);
    }

    /// Drains the queue and dispatches each event to every observer in
    /// registration order. An observer panicking does not abort dispatch
    /// to the others; the panic is caught and logged.
    pub(crate) fn drain(&self) {
        let events: Vec<CacheEvent> = std::mem::take(
            &mut *self.queue.lock().expect("notification queue lock poisoned"),
        );
        if events.is_empty() {
            return;
        }
        let observers = self
            .observers
            .lock()
            .expect("notification observers lock poisoned")
            .clone();
        for event in &events {
            for (_, observer) in &observers {
                let result = catch_unwind(AssertUnwindSafe(|| observer.on_event(event)));
                if result.is_err() {
                    log::error!("cache observer panicked while handling {event:?}");
                }
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use rstest::rstest;

    use super::*;

    struct RecordingObserver {
        seen: StdMutex<Vec<String>>,
    }

    impl CacheObserver for RecordingObserver {
        fn on_event(&self, event: &CacheEvent) {
            self.seen.lock().unwrap().push(format!("{event:?}"));
        }
    }

    struct PanickingObserver;

    impl CacheObserver for PanickingObserver {
        fn on_event(&self, _event: &CacheEvent) {
            panic!("boom");
        }
    }

    fn key(path: &str, mtime: u64) -> CacheKey {
        CacheKey::new(std::path::PathBuf::from(path), mtime)
    }

    #[rstest]
    fn test_dispatch_in_registration_order() {
        let center = NotificationCenter::default();
        let first = Arc::new(RecordingObserver {
            seen: StdMutex::new(vec![]),
        });
        center.subscribe(first.clone());
        center.enqueue(CacheEvent::Hit { key: key("a", 1) });
        center.drain();
        assert_eq!(first.seen.lock().unwrap().len(), 1);
    }

    #[rstest]
    fn test_panicking_observer_does_not_block_others() {
        let center = NotificationCenter::default();
        center.subscribe(Arc::new(PanickingObserver));
        let second = Arc::new(RecordingObserver {
            seen: StdMutex::new(vec![]),
        });
        center.subscribe(second.clone());
        center.enqueue(CacheEvent::Miss { key: key("a", 1) });
        center.drain();
        assert_eq!(second.seen.lock().unwrap().len(), 1);
    }

    #[rstest]
    fn test_unsubscribe_stops_delivery() {
        let center = NotificationCenter::default();
        let observer = Arc::new(RecordingObserver {
            seen: StdMutex::new(vec![]),
        });
        let id = center.subscribe(observer.clone());
        center.unsubscribe(id);
        center.enqueue(CacheEvent::Hit { key: key("a", 1) });
        center.drain();
        assert!(observer.seen.lock().unwrap().is_empty());
    }
}
