/*!
 * Metrics Collection
 * Process-wide lifecycle counters
 */

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

static GLOBAL_METRICS: OnceLock<LifecycleMetrics> = OnceLock::new();

/// Global lifecycle metrics
#[inline]
pub fn metrics() -> &'static LifecycleMetrics {
    GLOBAL_METRICS.get_or_init(LifecycleMetrics::new)
}

/// Lifecycle counters
///
/// Counters are monotonic. Guarded objects are single-threaded, but separate
/// threads may each drive their own, so the counters are atomics.
///
/// # Performance
/// - Cache-line aligned to prevent false sharing between threads updating
///   counters
#[repr(C, align(64))]
pub struct LifecycleMetrics {
    objects_created: AtomicU64,
    guards_acquired: AtomicU64,
    guards_released: AtomicU64,
    destroys_requested: AtomicU64,
    destroys_deferred: AtomicU64,
    teardowns_immediate: AtomicU64,
    teardowns_delayed: AtomicU64,
    undelayed_drops: AtomicU64,
    unmanaged_drops: AtomicU64,
    teardowns_by_type: Mutex<HashMap<&'static str, u64>>,
    start_time: Instant,
}

impl LifecycleMetrics {
    pub fn new() -> Self {
        Self {
            objects_created: AtomicU64::new(0),
            guards_acquired: AtomicU64::new(0),
            guards_released: AtomicU64::new(0),
            destroys_requested: AtomicU64::new(0),
            destroys_deferred: AtomicU64::new(0),
            teardowns_immediate: AtomicU64::new(0),
            teardowns_delayed: AtomicU64::new(0),
            undelayed_drops: AtomicU64::new(0),
            unmanaged_drops: AtomicU64::new(0),
            teardowns_by_type: Mutex::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    #[inline]
    pub(crate) fn record_created(&self) {
        self.objects_created.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_guard_acquired(&self) {
        self.guards_acquired.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_guard_released(&self) {
        self.guards_released.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_destroy_requested(&self) {
        self.destroys_requested.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_destroy_deferred(&self) {
        self.destroys_deferred.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_undelayed_drop(&self) {
        self.undelayed_drops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_unmanaged_drop(&self) {
        self.unmanaged_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_teardown(&self, type_name: &'static str, delayed: bool) {
        if delayed {
            self.teardowns_delayed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.teardowns_immediate.fetch_add(1, Ordering::Relaxed);
        }
        *self.teardowns_by_type.lock().entry(type_name).or_insert(0) += 1;
    }

    /// Teardowns recorded so far for one type
    pub fn teardowns_of(&self, type_name: &str) -> u64 {
        self.teardowns_by_type
            .lock()
            .get(type_name)
            .copied()
            .unwrap_or(0)
    }

    /// Get metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        let teardowns_by_type = self
            .teardowns_by_type
            .lock()
            .iter()
            .map(|(name, count)| (name.to_string(), *count))
            .collect();

        MetricsSnapshot {
            objects_created: self.objects_created.load(Ordering::Relaxed),
            guards_acquired: self.guards_acquired.load(Ordering::Relaxed),
            guards_released: self.guards_released.load(Ordering::Relaxed),
            destroys_requested: self.destroys_requested.load(Ordering::Relaxed),
            destroys_deferred: self.destroys_deferred.load(Ordering::Relaxed),
            teardowns_immediate: self.teardowns_immediate.load(Ordering::Relaxed),
            teardowns_delayed: self.teardowns_delayed.load(Ordering::Relaxed),
            undelayed_drops: self.undelayed_drops.load(Ordering::Relaxed),
            unmanaged_drops: self.unmanaged_drops.load(Ordering::Relaxed),
            teardowns_by_type,
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for LifecycleMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the lifecycle counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub objects_created: u64,
    pub guards_acquired: u64,
    pub guards_released: u64,
    pub destroys_requested: u64,
    pub destroys_deferred: u64,
    pub teardowns_immediate: u64,
    pub teardowns_delayed: u64,
    pub undelayed_drops: u64,
    pub unmanaged_drops: u64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub teardowns_by_type: BTreeMap<String, u64>,
    pub uptime_secs: u64,
}

impl MetricsSnapshot {
    /// Guards acquired but not yet released, across all objects
    #[inline]
    pub fn guards_outstanding(&self) -> u64 {
        self.guards_acquired.saturating_sub(self.guards_released)
    }

    #[inline]
    pub fn teardowns(&self) -> u64 {
        self.teardowns_immediate + self.teardowns_delayed
    }
}
