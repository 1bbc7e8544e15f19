//! Lock-free statistics for overlay activity.
//!
//! Counters use relaxed atomics: they are monitoring data, not
//! synchronization. A [`snapshot`](OverlayStats::snapshot) gives a
//! serializable point-in-time copy for status endpoints.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Activity counters for one overlay registry.
#[derive(Debug)]
pub struct OverlayStats {
    lookups: AtomicU64,
    lookup_misses: AtomicU64,
    listings: AtomicU64,
    opens: AtomicU64,
    reads: AtomicU64,
    bytes_read: AtomicU64,
    registrations: AtomicU64,
    collisions: AtomicU64,
    evictions: AtomicU64,
    last_activity: RwLock<Instant>,
}

impl OverlayStats {
    /// Creates a fresh set of counters.
    pub fn new() -> Self {
        Self {
            lookups: AtomicU64::new(0),
            lookup_misses: AtomicU64::new(0),
            listings: AtomicU64::new(0),
            opens: AtomicU64::new(0),
            reads: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            registrations: AtomicU64::new(0),
            collisions: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            last_activity: RwLock::new(Instant::now()),
        }
    }

    /// Records a lookup call.
    #[inline]
    pub fn record_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.touch();
    }

    /// Records a lookup that found nothing.
    #[inline]
    pub fn record_lookup_miss(&self) {
        self.lookup_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a directory listing.
    #[inline]
    pub fn record_listing(&self) {
        self.listings.fetch_add(1, Ordering::Relaxed);
        self.touch();
    }

    /// Records an entry open.
    #[inline]
    pub fn record_open(&self) {
        self.opens.fetch_add(1, Ordering::Relaxed);
        self.touch();
    }

    /// Records a handle read of `bytes` bytes.
    #[inline]
    pub fn record_read(&self, bytes: u64) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
        self.touch();
    }

    /// Records a successful registration.
    #[inline]
    pub fn record_registration(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
        self.touch();
    }

    /// Records a rejected registration (name collision).
    #[inline]
    pub fn record_collision(&self) {
        self.collisions.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a folder context eviction.
    #[inline]
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
        self.touch();
    }

    /// Whether any operation ran within `window`.
    pub fn is_active(&self, window: Duration) -> bool {
        self.last_activity.read().elapsed() <= window
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> OverlayStatsSnapshot {
        OverlayStatsSnapshot {
            lookups: self.lookups.load(Ordering::Relaxed),
            lookup_misses: self.lookup_misses.load(Ordering::Relaxed),
            listings: self.listings.load(Ordering::Relaxed),
            opens: self.opens.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            registrations: self.registrations.load(Ordering::Relaxed),
            collisions: self.collisions.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }
}

impl Default for OverlayStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable point-in-time copy of [`OverlayStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayStatsSnapshot {
    /// Lookup calls.
    pub lookups: u64,
    /// Lookups that found nothing.
    pub lookup_misses: u64,
    /// Directory listings.
    pub listings: u64,
    /// Entry opens.
    pub opens: u64,
    /// Handle reads.
    pub reads: u64,
    /// Bytes served through handle reads.
    pub bytes_read: u64,
    /// Successful registrations.
    pub registrations: u64,
    /// Registrations rejected for name collision.
    pub collisions: u64,
    /// Folder context evictions.
    pub evictions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let stats = OverlayStats::new();
        stats.record_lookup();
        stats.record_lookup();
        stats.record_lookup_miss();
        stats.record_read(4096);
        stats.record_read(1024);

        let snap = stats.snapshot();
        assert_eq!(snap.lookups, 2);
        assert_eq!(snap.lookup_misses, 1);
        assert_eq!(snap.reads, 2);
        assert_eq!(snap.bytes_read, 5120);
    }

    #[test]
    fn activity_window_tracks_recent_operations() {
        let stats = OverlayStats::new();
        stats.record_listing();
        assert!(stats.is_active(Duration::from_secs(60)));
        std::thread::sleep(Duration::from_millis(10));
        assert!(!stats.is_active(Duration::from_millis(1)));
    }

    #[test]
    fn snapshot_serializes() {
        let stats = OverlayStats::new();
        stats.record_registration();
        let json = serde_json::to_string(&stats.snapshot()).unwrap();
        let back: OverlayStatsSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.registrations, 1);
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(OverlayStats::new());
        let mut handles = vec![];
        for _ in 0..8 {
            let stats = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    stats.record_lookup();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(stats.snapshot().lookups, 8000);
    }
}
