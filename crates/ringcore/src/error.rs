use thiserror::Error;

/// Errors returned when constructing a ring.
///
/// These are the only fallible operations in this crate: every other
/// precondition (buffer too small, more than one producer) is either
/// enforced by the type system or left as a caller bug, per the ring
/// protocol's contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    /// The requested capacity was not a power of two.
    #[error("ring capacity {0} is not a power of two")]
    CapacityNotPowerOfTwo(usize),
    /// The requested capacity was smaller than the minimum of 2.
    #[error("ring capacity {0} is below the minimum of 2")]
    CapacityTooSmall(usize),
}
