use std::sync::atomic::{AtomicU64, Ordering};

/// Optional atomic counters for monitoring ring activity.
///
/// Collection is gated behind `Config::enable_metrics` so rings that don't
/// want the extra atomic traffic don't pay for it.
#[derive(Debug, Default)]
pub struct Metrics {
    entries_enqueued: AtomicU64,
    entries_dequeued: AtomicU64,
    spmc_cas_retries: AtomicU64,
    spmc_cas_failures: AtomicU64,
}

impl Metrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_enqueue(&self) {
        self.entries_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dequeue(&self) {
        self.entries_dequeued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_spmc_retry(&self) {
        self.spmc_cas_retries.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_spmc_cas_failure(&self) {
        self.spmc_cas_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            entries_enqueued: self.entries_enqueued.load(Ordering::Relaxed),
            entries_dequeued: self.entries_dequeued.load(Ordering::Relaxed),
            spmc_cas_retries: self.spmc_cas_retries.load(Ordering::Relaxed),
            spmc_cas_failures: self.spmc_cas_failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of a ring's [`Metrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub entries_enqueued: u64,
    pub entries_dequeued: u64,
    /// Number of failed CAS attempts retried by `dequeue_spmc`.
    pub spmc_cas_retries: u64,
    /// Number of CAS attempts that failed in `try_dequeue_spmc` (each one
    /// returns `None` to the caller instead of retrying).
    pub spmc_cas_failures: u64,
}
