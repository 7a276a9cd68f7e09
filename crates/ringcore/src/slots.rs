use std::marker::PhantomData;
use std::mem::size_of;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Marker bound for entries stored in the ring: a pointer-sized, trivially
/// copyable handle. The ring never interprets the bits of an `Entry`, never
/// drops one in place, and never copies more than one machine word's worth
/// of data per slot.
///
/// There is no portable way to assert `size_of::<T>() <= size_of::<usize>()`
/// at the trait-bound level without nightly `generic_const_exprs`, so the
/// check instead runs once at ring construction time (see
/// `SlotBuffer::new`).
pub trait RingEntry: Copy {}

impl<T: Copy> RingEntry for T {}

/// Bit-copies `entry` into the low bytes of a machine word. Any bytes beyond
/// `size_of::<Entry>()` are left zeroed.
///
/// SAFETY: `size_of::<Entry>() <= size_of::<usize>()`, checked at
/// `SlotBuffer::new`.
#[inline]
unsafe fn to_word<Entry: RingEntry>(entry: Entry) -> usize {
    let mut word: usize = 0;
    std::ptr::copy_nonoverlapping(
        (&entry as *const Entry).cast::<u8>(),
        (&mut word as *mut usize).cast::<u8>(),
        size_of::<Entry>(),
    );
    word
}

/// Bit-copies the low bytes of `word` back into an `Entry`.
///
/// SAFETY: `word` must have been produced by `to_word::<Entry>` (or be the
/// zero word, never read before a producer writes it) and
/// `size_of::<Entry>() <= size_of::<usize>()`, checked at `SlotBuffer::new`.
#[inline]
unsafe fn from_word<Entry: RingEntry>(word: usize) -> Entry {
    let mut entry = std::mem::MaybeUninit::<Entry>::uninit();
    std::ptr::copy_nonoverlapping(
        (&word as *const usize).cast::<u8>(),
        entry.as_mut_ptr().cast::<u8>(),
        size_of::<Entry>(),
    );
    entry.assume_init()
}

/// A small `Copy` handle referencing caller-owned slot storage. The ring
/// core never allocates, resizes, or frees this storage — it only indexes
/// into it. Passed by value to every operation.
///
/// Slots are backed by `AtomicUsize`, not a plain `UnsafeCell`: the SPMC
/// retry loop reads a slot whose claim it has not yet won, and a losing
/// reader's load can be concurrent, in real time, with the producer's next
/// write to that same slot once a winning consumer's CAS has already
/// advanced `c_head` past it (the producer only waits on `c_head`, not on
/// any per-slot handshake with losing readers). A plain, non-atomic access
/// would make that a data race; storing the slot contents in an atomic word
/// and using `Ordering::Relaxed` loads/stores keeps the access race-free
/// while leaving all the actual ordering to the fences around it, exactly
/// as the surrounding protocol already does for `c_head`/`p_tail`.
pub struct SlotBuffer<'a, Entry> {
    slots: &'a [AtomicUsize],
    _entry: PhantomData<Entry>,
}

impl<'a, Entry> Clone for SlotBuffer<'a, Entry> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<'a, Entry> Copy for SlotBuffer<'a, Entry> {}

// SAFETY: a `SlotBuffer` is just a reference to producer/consumer-shared
// slot storage; the ring protocol (enforced by the handle types in
// `spsc`/`spmc`) is what makes concurrent access to the referenced cells
// sound, not anything about `SlotBuffer` itself.
unsafe impl<'a, Entry: Send> Send for SlotBuffer<'a, Entry> {}
unsafe impl<'a, Entry: Send> Sync for SlotBuffer<'a, Entry> {}

impl<'a, Entry: RingEntry> SlotBuffer<'a, Entry> {
    /// Wraps a caller-owned slice of slots. The slice's length must equal
    /// the ring's `size`; this is a precondition the raw API does not
    /// check (a caller bug, not a runtime error), though the owning
    /// `SpscRing`/`SpmcRing` constructors make a mismatch impossible by
    /// allocating the buffer themselves.
    pub fn new(slots: &'a [AtomicUsize]) -> Self {
        debug_assert!(
            size_of::<Entry>() <= size_of::<usize>(),
            "Entry must be no larger than a machine word"
        );
        Self {
            slots,
            _entry: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Writes `entry` into the slot at `idx`.
    ///
    /// SAFETY: the caller must hold exclusive producer rights to this slot
    /// for the current generation (enforced by the enqueue protocol, which
    /// never writes a slot still owned by an unconsumed entry).
    #[inline]
    pub(crate) unsafe fn write(&self, idx: usize, entry: Entry) {
        self.slots[idx].store(to_word(entry), Ordering::Relaxed);
    }

    /// Reads the entry currently stored at `idx`.
    ///
    /// SAFETY: the caller must have observed (via the producer's tail
    /// publish) that this slot holds a fully-written entry before treating
    /// the result as meaningful, and must not commit to having consumed the
    /// same generation's slot twice (the consumer protocols guarantee
    /// both). The load itself is always memory-safe — it's an atomic
    /// read of a word that is always initialized — even when called
    /// speculatively by a losing SPMC consumer racing the producer's next
    /// write.
    #[inline]
    pub(crate) unsafe fn read(&self, idx: usize) -> Entry {
        from_word(self.slots[idx].load(Ordering::Relaxed))
    }
}
