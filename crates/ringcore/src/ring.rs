//! Owning convenience layer over [`RingHeader`] + [`SlotBuffer`].
//!
//! The raw core in `header.rs`/`slots.rs` keeps the control block and the
//! slot array decoupled: a control block and an externally-owned slot
//! array, passed separately to every operation. That's awkward to hand out
//! safely across threads on its own (something has to own the allocation
//! and keep it alive for as long as any handle can touch it), so this
//! module wraps the pair in a single `Arc`-backed allocation and hands back
//! single-producer / single- or multi-consumer handles on top of it.

use crate::error::RingError;
use crate::header::RingHeader;
use crate::metrics::MetricsSnapshot;
use crate::slots::{RingEntry, SlotBuffer};
use crate::Config;
use std::marker::PhantomData;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

struct RingInner<Entry> {
    header: RingHeader,
    storage: Box<[AtomicUsize]>,
    _entry: PhantomData<Entry>,
}

// SAFETY: `RingInner` is Send/Sync as long as `Entry` is Send. Concurrent
// access to `storage` is made sound by the SPSC/SPMC protocols implemented
// on `RingHeader`, not by anything intrinsic to this struct.
unsafe impl<Entry: Send> Send for RingInner<Entry> {}
unsafe impl<Entry: Send> Sync for RingInner<Entry> {}

impl<Entry: RingEntry> RingInner<Entry> {
    fn new(config: Config) -> Self {
        let storage = (0..config.capacity())
            .map(|_| AtomicUsize::new(0))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            header: RingHeader::from_config(config),
            storage,
            _entry: PhantomData,
        }
    }

    #[inline]
    fn buf(&self) -> SlotBuffer<'_, Entry> {
        SlotBuffer::new(&self.storage)
    }
}

// =============================================================================
// SPSC
// =============================================================================

/// Constructs an SPSC ring, returning a single-producer and single-consumer
/// handle pair. Neither handle is `Clone` — the type system is what enforces
/// the single-producer/single-consumer discipline; there is no runtime
/// check.
pub struct SpscRing;

impl SpscRing {
    /// Allocates a ring of the given capacity (must be a power of two, at
    /// least 2).
    pub fn with_capacity<Entry: RingEntry>(
        capacity: usize,
    ) -> Result<(SpscProducer<Entry>, SpscConsumer<Entry>), RingError> {
        Self::with_config(Config::new(capacity, false)?)
    }

    /// As [`SpscRing::with_capacity`], taking a pre-validated [`Config`]
    /// (e.g. to enable metrics collection).
    pub fn with_config<Entry: RingEntry>(
        config: Config,
    ) -> Result<(SpscProducer<Entry>, SpscConsumer<Entry>), RingError> {
        let inner = Arc::new(RingInner::new(config));
        Ok((
            SpscProducer {
                inner: Arc::clone(&inner),
            },
            SpscConsumer { inner },
        ))
    }
}

/// The sole producer handle for an SPSC ring. Not `Clone`.
pub struct SpscProducer<Entry: RingEntry> {
    inner: Arc<RingInner<Entry>>,
}

impl<Entry: RingEntry> SpscProducer<Entry> {
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.header.capacity()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.header.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.header.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.inner.header.is_full()
    }

    /// Returns `true` if stored, `false` if the ring was full.
    #[inline]
    pub fn enqueue(&self, entry: Entry) -> bool {
        self.inner.header.enqueue(self.inner.buf(), entry)
    }

    /// As [`SpscProducer::enqueue`], additionally returning the
    /// pre-insertion occupied-slot count.
    #[inline]
    pub fn enqueue_with_size(&self, entry: Entry) -> (bool, usize) {
        self.inner.header.enqueue_with_size(self.inner.buf(), entry)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.header.metrics()
    }
}

// SAFETY: a producer handle is Send if Entry is; it is intentionally not
// Sync (and not Clone), so only one thread can ever hold the producer role.
unsafe impl<Entry: RingEntry + Send> Send for SpscProducer<Entry> {}

/// The sole consumer handle for an SPSC ring. Not `Clone`.
pub struct SpscConsumer<Entry: RingEntry> {
    inner: Arc<RingInner<Entry>>,
}

impl<Entry: RingEntry> SpscConsumer<Entry> {
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.header.capacity()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.header.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.header.is_empty()
    }

    /// Removes and returns the oldest entry, or `None` if empty.
    #[inline]
    pub fn dequeue(&self) -> Option<Entry> {
        self.inner.header.dequeue_spsc(self.inner.buf())
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.header.metrics()
    }
}

unsafe impl<Entry: RingEntry + Send> Send for SpscConsumer<Entry> {}

// =============================================================================
// SPMC
// =============================================================================

/// Constructs an SPMC ring, returning a single-producer handle and one
/// `Clone`-able consumer handle that any number of threads may share (each
/// clone, or the same clone used from multiple threads, contends for
/// entries via the CAS retry loop in [`SpmcConsumer::dequeue`]).
pub struct SpmcRing;

impl SpmcRing {
    pub fn with_capacity<Entry: RingEntry>(
        capacity: usize,
    ) -> Result<(SpmcProducer<Entry>, SpmcConsumer<Entry>), RingError> {
        Self::with_config(Config::new(capacity, false)?)
    }

    pub fn with_config<Entry: RingEntry>(
        config: Config,
    ) -> Result<(SpmcProducer<Entry>, SpmcConsumer<Entry>), RingError> {
        let inner = Arc::new(RingInner::new(config));
        Ok((
            SpmcProducer {
                inner: Arc::clone(&inner),
            },
            SpmcConsumer { inner },
        ))
    }
}

/// The sole producer handle for an SPMC ring. Not `Clone`.
pub struct SpmcProducer<Entry: RingEntry> {
    inner: Arc<RingInner<Entry>>,
}

impl<Entry: RingEntry> SpmcProducer<Entry> {
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.header.capacity()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.header.len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.inner.header.is_full()
    }

    #[inline]
    pub fn enqueue(&self, entry: Entry) -> bool {
        self.inner.header.enqueue(self.inner.buf(), entry)
    }

    #[inline]
    pub fn enqueue_with_size(&self, entry: Entry) -> (bool, usize) {
        self.inner.header.enqueue_with_size(self.inner.buf(), entry)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.header.metrics()
    }
}

unsafe impl<Entry: RingEntry + Send> Send for SpmcProducer<Entry> {}

/// A sharable consumer handle for an SPMC ring. Any number of threads may
/// hold clones of (or share references to) this handle and call
/// [`SpmcConsumer::dequeue`]/[`SpmcConsumer::try_dequeue`] concurrently.
pub struct SpmcConsumer<Entry: RingEntry> {
    inner: Arc<RingInner<Entry>>,
}

impl<Entry: RingEntry> Clone for SpmcConsumer<Entry> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<Entry: RingEntry> SpmcConsumer<Entry> {
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.header.capacity()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.header.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.header.is_empty()
    }

    /// Removes and returns an entry, retrying the CAS on contention.
    /// Returns `None` only when the ring is observed empty.
    #[inline]
    pub fn dequeue(&self) -> Option<Entry> {
        self.inner.header.dequeue_spmc(self.inner.buf())
    }

    /// As [`SpmcConsumer::dequeue`] but attempts the CAS exactly once: a
    /// contended attempt returns `None`, indistinguishable from empty.
    #[inline]
    pub fn try_dequeue(&self) -> Option<Entry> {
        self.inner.header.try_dequeue_spmc(self.inner.buf())
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.header.metrics()
    }
}

unsafe impl<Entry: RingEntry + Send> Send for SpmcConsumer<Entry> {}
unsafe impl<Entry: RingEntry + Send> Sync for SpmcConsumer<Entry> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn spsc_round_trip() {
        let (tx, rx) = SpscRing::with_capacity::<u64>(4).unwrap();
        assert!(tx.enqueue(1));
        assert!(tx.enqueue(2));
        assert_eq!(rx.dequeue(), Some(1));
        assert_eq!(rx.dequeue(), Some(2));
        assert_eq!(rx.dequeue(), None);
    }

    #[test]
    fn spsc_across_threads() {
        let (tx, rx) = SpscRing::with_capacity::<u64>(1024).unwrap();
        let producer = thread::spawn(move || {
            for i in 0..10_000u64 {
                while !tx.enqueue(i) {
                    std::hint::spin_loop();
                }
            }
        });

        let mut received = Vec::with_capacity(10_000);
        while received.len() < 10_000 {
            if let Some(v) = rx.dequeue() {
                received.push(v);
            }
        }
        producer.join().unwrap();
        assert_eq!(received, (0..10_000u64).collect::<Vec<_>>());
    }

    #[test]
    fn spmc_fans_out_to_several_consumers() {
        use std::sync::atomic::{AtomicU64, Ordering};

        let (tx, rx) = SpmcRing::with_capacity::<u64>(1024).unwrap();
        let total = 50_000u64;
        let consumed = Arc::new(AtomicU64::new(0));

        let producer = thread::spawn(move || {
            for i in 0..total {
                while !tx.enqueue(i) {
                    std::hint::spin_loop();
                }
            }
        });

        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let rx = rx.clone();
                let consumed = Arc::clone(&consumed);
                thread::spawn(move || {
                    let mut received = Vec::new();
                    while consumed.load(Ordering::Relaxed) < total {
                        if let Some(v) = rx.dequeue() {
                            received.push(v);
                            consumed.fetch_add(1, Ordering::Relaxed);
                        } else {
                            std::hint::spin_loop();
                        }
                    }
                    received
                })
            })
            .collect();

        producer.join().unwrap();

        let mut all_received: Vec<u64> = Vec::new();
        for c in consumers {
            all_received.extend(c.join().unwrap());
        }

        all_received.sort_unstable();
        assert_eq!(all_received, (0..total).collect::<Vec<_>>());
    }
}
