//! A lock-free bounded ring buffer supporting single-producer/single-consumer
//! (SPSC) and single-producer/multi-consumer (SPMC) access patterns.
//!
//! Entries are word-sized [`RingEntry`] values (typically a pointer, index, or
//! small `Copy` handle) stored in slots the ring never allocates itself: the
//! raw [`header::RingHeader`] control block operates purely on indices into a
//! caller-supplied [`slots::SlotBuffer`]. [`SpscRing`] and [`SpmcRing`] wrap
//! that core in an `Arc`-backed allocation and hand out typed producer /
//! consumer handles so most callers never touch the raw layer directly.
//!
//! Capacity is always a power of two, and one slot is permanently reserved to
//! disambiguate full from empty — a ring constructed with capacity 4 holds at
//! most 3 live entries. See [`Config`] for the capacity/metrics knobs.
//!
//! ```
//! use ringcore::SpscRing;
//!
//! let (tx, rx) = SpscRing::with_capacity::<u64>(16).unwrap();
//! assert!(tx.enqueue(42));
//! assert_eq!(rx.dequeue(), Some(42));
//! ```

mod backoff;
mod config;
mod error;
mod header;
mod invariants;
mod metrics;
mod ring;
mod slots;

pub use backoff::Backoff;
pub use config::Config;
pub use error::RingError;
pub use header::RingHeader;
pub use metrics::{Metrics, MetricsSnapshot};
pub use ring::{SpmcConsumer, SpmcProducer, SpmcRing, SpscConsumer, SpscProducer, SpscRing};
pub use slots::{RingEntry, SlotBuffer};
