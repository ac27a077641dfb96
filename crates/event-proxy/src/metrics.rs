//! Counters for the event proxy.
//!
//! In-process only; callers read them through [`ProxyMetrics::snapshot`].

use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters updated by producers, the publisher loop and the
/// filter engine.
#[derive(Debug, Default)]
pub struct ProxyMetrics {
    /// Events accepted into the ordering queue
    pub enqueued: AtomicU64,
    /// Events the bus accepted
    pub delivered: AtomicU64,
    /// Send attempts that failed
    pub delivery_failures: AtomicU64,
    /// Submissions refused before enqueue
    pub rejected: AtomicU64,
    /// Filter checks that excluded the event
    pub excluded: AtomicU64,
    /// Filter checks that let the event through
    pub allowed: AtomicU64,
}

impl ProxyMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery(&self, ok: bool) {
        if ok {
            self.delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.delivery_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_filter(&self, excluded: bool) {
        if excluded {
            self.excluded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.allowed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            excluded: self.excluded.load(Ordering::Relaxed),
            allowed: self.allowed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`ProxyMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub enqueued: u64,
    pub delivered: u64,
    pub delivery_failures: u64,
    pub rejected: u64,
    pub excluded: u64,
    pub allowed: u64,
}

impl MetricsSnapshot {
    /// Events accepted but not yet through a send attempt.
    pub fn in_flight(&self) -> u64 {
        self.enqueued
            .saturating_sub(self.delivered + self.delivery_failures)
    }
}
