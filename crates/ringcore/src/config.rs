use crate::error::RingError;

/// Configuration for a ring.
///
/// Capacity is expressed as `size_bits` (a power-of-two exponent) so the
/// mask is a `const` derived quantity rather than something checked on the
/// hot path; `Config::new` is the validating entry point for callers who
/// only have a raw capacity in hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// `size = 1 << size_bits`.
    size_bits: u8,
    /// Collect atomic counters for enqueue/dequeue activity.
    pub enable_metrics: bool,
}

impl Config {
    /// Maximum `size_bits`, chosen to keep `size` comfortably under
    /// `usize::MAX / 2` on 32-bit targets as well as 64-bit ones.
    const MAX_SIZE_BITS: u8 = 28;

    /// Creates a configuration from a raw capacity, validating that it is a
    /// power of two no smaller than 2.
    pub fn new(capacity: usize, enable_metrics: bool) -> Result<Self, RingError> {
        if capacity < 2 {
            return Err(RingError::CapacityTooSmall(capacity));
        }
        if !capacity.is_power_of_two() {
            return Err(RingError::CapacityNotPowerOfTwo(capacity));
        }
        let size_bits = capacity.trailing_zeros() as u8;
        debug_assert!(size_bits <= Self::MAX_SIZE_BITS);
        Ok(Self {
            size_bits,
            enable_metrics,
        })
    }

    /// Creates a configuration directly from a power-of-two exponent.
    pub const fn from_bits(size_bits: u8, enable_metrics: bool) -> Self {
        assert!(size_bits >= 1 && size_bits <= Self::MAX_SIZE_BITS);
        Self {
            size_bits,
            enable_metrics,
        }
    }

    /// Returns the ring capacity (`size`).
    #[inline]
    pub const fn capacity(&self) -> usize {
        1 << self.size_bits
    }

    /// Returns the index mask (`size - 1`).
    #[inline]
    pub const fn mask(&self) -> usize {
        self.capacity() - 1
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_bits(10, false) // 1024 slots
    }
}
