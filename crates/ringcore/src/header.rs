//! The ring control block and its operations.
//!
//! # Memory ordering & synchronization strategy
//!
//! The protocol is built from three standalone fences rather than ordering
//! baked into each atomic access:
//!
//! - release -> `Ordering::Release` via `atomic::fence`
//! - acquire -> `Ordering::Acquire` via `atomic::fence`
//! - full barrier -> `Ordering::SeqCst` via `atomic::fence`
//!
//! Every atomic load/store of `c_head`/`p_tail` itself uses `Ordering::Relaxed`
//! — all the ordering is carried by the explicit fences surrounding them.
//! This is the "relaxed loads/stores plus standalone fences" style of
//! `ck_ring.h`, not the "ordering baked into the access" style more common
//! in idiomatic Rust atomics code — it is written this way here because the
//! algorithm is specified step by step at that granularity, and keeping the
//! fences explicit keeps each step traceable to its ordering requirement.
//!
//! **Producer (enqueue):**
//! 1. Relaxed load of `c_head`.
//! 2. Relaxed load of `p_tail` (single-writer; the producer is the only
//!    thread that ever stores it).
//! 3. Compute the candidate new tail; if it would collide with `c_head`'s
//!    slot, the ring is full.
//! 4. Write the entry into its slot (unordered; the fence below publishes it).
//! 5. `fence(Release)`.
//! 6. Relaxed store of the new `p_tail`.
//!
//! **Consumer (dequeue, SPSC):**
//! 1. Relaxed load of `c_head` (single-writer).
//! 2. Relaxed load of `p_tail`; if equal to `c_head`, empty.
//! 3. `fence(Acquire)` — pairs with the producer's release store.
//! 4. Read the slot.
//! 5. `fence(Release)` — so the read completes before `c_head` advances,
//!    preventing the producer from overwriting the slot before the read
//!    has latched its value.
//! 6. Relaxed store of the new `c_head`.
//!
//! **Consumer (dequeue, SPMC)** adds a CAS on `c_head` instead of a plain
//! store, with the slot read re-validated by that CAS — see
//! [`RingHeader::dequeue_spmc`].

use crate::backoff::Backoff;
use crate::config::Config;
use crate::error::RingError;
use crate::invariants::{
    debug_assert_bounded_count, debug_assert_monotonic, debug_assert_occupied_read,
};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::slots::{RingEntry, SlotBuffer};
use crossbeam_utils::CachePadded;
use std::sync::atomic::{fence, AtomicUsize, Ordering};

/// The ring control block: two independently-padded counters plus the
/// fixed capacity/mask pair. Does not own the slot array — callers supply
/// a [`SlotBuffer`] to every operation.
pub struct RingHeader {
    /// Count of entries inserted so far. Written only by the producer.
    p_tail: CachePadded<AtomicUsize>,
    /// Count of entries removed so far. Written by the consumer (SPSC) or
    /// via CAS by any consumer (SPMC).
    c_head: CachePadded<AtomicUsize>,
    size: usize,
    mask: usize,
    metrics: Metrics,
    enable_metrics: bool,
}

impl RingHeader {
    /// Initializes a new control block.
    ///
    /// This validates `capacity` and returns `Err` instead of relying on
    /// the caller to have pre-checked it — a safe Rust constructor cannot
    /// accept "undefined behavior if you get this wrong" as a contract the
    /// way a header-only C primitive can.
    pub fn init(capacity: usize) -> Result<Self, RingError> {
        Ok(Self::from_config(Config::new(capacity, false)?))
    }

    pub(crate) fn from_config(config: Config) -> Self {
        Self {
            p_tail: CachePadded::new(AtomicUsize::new(0)),
            c_head: CachePadded::new(AtomicUsize::new(0)),
            size: config.capacity(),
            mask: config.mask(),
            metrics: Metrics::new(),
            enable_metrics: config.enable_metrics,
        }
    }

    // -------------------------------------------------------------------
    // Size / capacity inspectors
    // -------------------------------------------------------------------

    /// Returns the ring's fixed capacity. No synchronization.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.size
    }

    /// Best-effort occupied-slot count: `(p_tail - c_head) & mask`, loaded
    /// with relaxed atomics. Not atomic across the two loads — may briefly
    /// read `size - 1` while a dequeue is in flight. Safe from any thread.
    #[inline]
    pub fn len(&self) -> usize {
        let tail = self.p_tail.load(Ordering::Relaxed);
        let head = self.c_head.load(Ordering::Relaxed);
        tail.wrapping_sub(head) & self.mask
    }

    /// `len() == 0`, by definition `p_tail == c_head`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.p_tail.load(Ordering::Relaxed) == self.c_head.load(Ordering::Relaxed)
    }

    /// `len() == size - 1`, i.e. one more enqueue would find `p_tail + 1`
    /// colliding with `c_head` in slot space.
    #[inline]
    pub fn is_full(&self) -> bool {
        let tail = self.p_tail.load(Ordering::Relaxed);
        let head = self.c_head.load(Ordering::Relaxed);
        (tail.wrapping_add(1) & self.mask) == (head & self.mask)
    }

    /// Snapshot of enqueue/dequeue/retry counters, if `enable_metrics` was
    /// set at construction; a default (all-zero) snapshot otherwise.
    pub fn metrics(&self) -> MetricsSnapshot {
        if self.enable_metrics {
            self.metrics.snapshot()
        } else {
            MetricsSnapshot::default()
        }
    }

    // -------------------------------------------------------------------
    // Enqueue — shared by SPSC and SPMC
    // -------------------------------------------------------------------

    /// Attempts to store `entry`. Returns `true` if stored, `false` if the
    /// ring was full at the linearization point (the `p_tail` store below).
    ///
    /// Contract: exactly one producer thread may call this concurrently
    /// with any number of consumers. Never blocks.
    pub fn enqueue<Entry: RingEntry>(&self, buf: SlotBuffer<'_, Entry>, entry: Entry) -> bool {
        self.enqueue_with_size(buf, entry).0
    }

    /// As [`RingHeader::enqueue`], additionally returning the occupied-slot
    /// count observed just *before* the insertion attempt (pre-insertion
    /// semantics — an open question in the original design, resolved here and
    /// documented: this is the snapshot as it stood before this call, not
    /// after). The snapshot is returned whether or not the insertion
    /// succeeds, since it describes the state the attempt was made against.
    pub fn enqueue_with_size<Entry: RingEntry>(
        &self,
        buf: SlotBuffer<'_, Entry>,
        entry: Entry,
    ) -> (bool, usize) {
        debug_assert_eq!(buf.len(), self.size, "slot buffer length must equal ring size");

        // Step 1: observe a value of c_head no later than current.
        let c_head = self.c_head.load(Ordering::Relaxed);
        // Step 2: p_tail has a single writer (this producer) — relaxed
        // suffices, it's equivalent to a non-atomic read of our own state.
        let p_tail = self.p_tail.load(Ordering::Relaxed);
        let pre_size = p_tail.wrapping_sub(c_head) & self.mask;

        // Step 3/4: would the new tail collide with c_head's slot?
        let new_tail = p_tail.wrapping_add(1);
        if (new_tail & self.mask) == (c_head & self.mask) {
            return (false, pre_size);
        }
        debug_assert_bounded_count!(pre_size, self.size);

        // Step 5: publish the entry into its slot.
        // SAFETY: slots in [c_head, p_tail) are occupied; p_tail's slot is
        // not one of them (the full check above guarantees a free slot),
        // and only this producer ever writes to it.
        unsafe { buf.write(p_tail & self.mask, entry) };

        // Step 6: release fence publishes the slot write before the tail
        // becomes visible to consumers.
        fence(Ordering::Release);

        // Step 7: the linearization point.
        debug_assert_monotonic!("p_tail", p_tail, new_tail);
        self.p_tail.store(new_tail, Ordering::Relaxed);

        if self.enable_metrics {
            self.metrics.record_enqueue();
        }

        (true, pre_size)
    }

    // -------------------------------------------------------------------
    // SPSC dequeue
    // -------------------------------------------------------------------

    /// Removes and returns the oldest entry, or `None` if empty.
    ///
    /// Contract: exactly one consumer thread may call this, concurrent
    /// with at most one producer calling `enqueue`. Never blocks.
    pub fn dequeue_spsc<Entry: RingEntry>(&self, buf: SlotBuffer<'_, Entry>) -> Option<Entry> {
        debug_assert_eq!(buf.len(), self.size, "slot buffer length must equal ring size");

        // Step 1: c_head has a single writer (this consumer).
        let c_head = self.c_head.load(Ordering::Relaxed);
        // Step 2: atomic load of p_tail.
        let p_tail = self.p_tail.load(Ordering::Relaxed);

        // Step 3: empty?
        if c_head == p_tail {
            return None;
        }

        // Step 4: acquire fence orders the slot read after observing p_tail.
        fence(Ordering::Acquire);

        // Step 5: latch the entry.
        debug_assert_occupied_read!(c_head, c_head, p_tail);
        // SAFETY: c_head != p_tail, so slot (c_head & mask) was published
        // by the producer and is not yet reused (only this consumer ever
        // advances c_head past it).
        let entry = unsafe { buf.read(c_head & self.mask) };

        // Step 6: release fence — the read completes before c_head
        // advances, so the producer can't overwrite the slot first.
        fence(Ordering::Release);

        // Step 7: linearization point.
        let new_head = c_head.wrapping_add(1);
        debug_assert_monotonic!("c_head", c_head, new_head);
        self.c_head.store(new_head, Ordering::Relaxed);

        if self.enable_metrics {
            self.metrics.record_dequeue();
        }

        Some(entry)
    }

    // -------------------------------------------------------------------
    // SPMC dequeue, retrying
    // -------------------------------------------------------------------

    /// Removes and returns the oldest entry not yet claimed by another
    /// consumer. Returns `None` only when the ring is observed empty;
    /// contention among consumers is resolved by retrying the CAS, not by
    /// returning `None`.
    ///
    /// Contract: any number of consumer threads may call this concurrently
    /// with at most one producer calling `enqueue`. Lock-free but not
    /// wait-free: a losing consumer retries, so an unbounded number of
    /// concurrent winners could in principle starve one loser.
    pub fn dequeue_spmc<Entry: RingEntry>(&self, buf: SlotBuffer<'_, Entry>) -> Option<Entry> {
        debug_assert_eq!(buf.len(), self.size, "slot buffer length must equal ring size");

        let mut consumer = self.c_head.load(Ordering::Relaxed);
        let mut backoff = Backoff::new();

        loop {
            // Step a: pairs with the producer's release before we read p_tail.
            fence(Ordering::Acquire);
            // Step b.
            let producer = self.p_tail.load(Ordering::Relaxed);
            // Step c: empty at this observation.
            if consumer == producer {
                return None;
            }

            // Step d.
            fence(Ordering::Acquire);
            // Step e: latch the slot value. This load is not re-validated
            // until the CAS below succeeds — if the CAS fails, another
            // consumer has already won the slot, and by the time we notice
            // the producer may already be mid-write to it for the next lap;
            // `candidate` is discarded in that case, but the read into it
            // must still be race-free, which is why the slot itself is an
            // atomic word rather than a plain `UnsafeCell` access (see
            // `SlotBuffer::read`).
            // SAFETY: `consumer != producer`, so the slot at
            // `consumer & mask` was published by the producer; whether we
            // still "own" this generation is decided by the CAS, not by
            // this read.
            debug_assert_occupied_read!(consumer, consumer, producer);
            let candidate = unsafe { buf.read(consumer & self.mask) };

            // Step f: full barrier between the slot read and the head CAS.
            fence(Ordering::SeqCst);

            // Step g: commit the claim and validate the read in one step.
            match self.c_head.compare_exchange(
                consumer,
                consumer.wrapping_add(1),
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => {
                    if self.enable_metrics {
                        self.metrics.record_dequeue();
                    }
                    return Some(candidate);
                }
                Err(observed) => {
                    consumer = observed;
                    if self.enable_metrics {
                        self.metrics.record_spmc_retry();
                    }
                    backoff.snooze();
                }
            }
        }
    }

    // -------------------------------------------------------------------
    // SPMC try-dequeue, single attempt
    // -------------------------------------------------------------------

    /// Identical protocol to [`RingHeader::dequeue_spmc`] but attempts the
    /// CAS exactly once: a contended attempt returns `None`, indistinguishable
    /// at the caller level from an empty ring, by design. Callers that want
    /// their own backoff policy use this instead of the retrying variant.
    pub fn try_dequeue_spmc<Entry: RingEntry>(&self, buf: SlotBuffer<'_, Entry>) -> Option<Entry> {
        debug_assert_eq!(buf.len(), self.size, "slot buffer length must equal ring size");

        let consumer = self.c_head.load(Ordering::Relaxed);

        fence(Ordering::Acquire);
        let producer = self.p_tail.load(Ordering::Relaxed);
        if consumer == producer {
            return None;
        }

        fence(Ordering::Acquire);
        // SAFETY: see `dequeue_spmc` — validated by the CAS below.
        debug_assert_occupied_read!(consumer, consumer, producer);
        let candidate = unsafe { buf.read(consumer & self.mask) };

        fence(Ordering::SeqCst);

        match self.c_head.compare_exchange(
            consumer,
            consumer.wrapping_add(1),
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => {
                if self.enable_metrics {
                    self.metrics.record_dequeue();
                }
                Some(candidate)
            }
            Err(_) => {
                if self.enable_metrics {
                    self.metrics.record_spmc_cas_failure();
                }
                None
            }
        }
    }
}
