//! Maps requested element counts to concrete table sizes.
//!
//! A table sized for `max_count` elements holds `max_count` dense buckets and
//! an index of `2 * max_count` probe slots, so the index load factor of live
//! entries never exceeds one half.

/// Smallest non-zero bucket count a table is allocated with.
pub const MIN_CAPACITY: usize = 4;

/// Number of index slots per bucket.
const SLOTS_PER_BUCKET: usize = 2;

/// Returns the bucket count a table needs to hold `requested` elements.
///
/// Zero stays zero so that empty requests never allocate. Any other request is
/// rounded up to a power of two no smaller than [`MIN_CAPACITY`].
///
/// # Panics
///
/// Panics with `"capacity overflow"` if the result does not fit in `usize`.
///
/// ```rust
/// use alloc_hash::capacity::capacity_for;
///
/// assert_eq!(capacity_for(0), 0);
/// assert_eq!(capacity_for(1), 4);
/// assert_eq!(capacity_for(8), 8);
/// assert_eq!(capacity_for(9), 16);
/// ```
#[inline]
pub fn capacity_for(requested: usize) -> usize {
    match checked_capacity_for(requested) {
        Some(capacity) => capacity,
        None => capacity_overflow(),
    }
}

/// Returns `true` if a table with `max_count` buckets can hold `requested`
/// elements without reallocating.
#[inline]
pub fn satisfies(max_count: usize, requested: usize) -> bool {
    requested <= max_count
}

#[inline]
pub(crate) fn checked_capacity_for(requested: usize) -> Option<usize> {
    if requested == 0 {
        return Some(0);
    }

    let buckets = requested.checked_next_power_of_two()?.max(MIN_CAPACITY);
    // The index must be addressable too.
    buckets.checked_mul(SLOTS_PER_BUCKET)?;
    Some(buckets)
}

/// Number of index slots backing `max_count` buckets.
#[inline]
pub(crate) fn slots_for(max_count: usize) -> usize {
    max_count * SLOTS_PER_BUCKET
}

/// Live entries plus tombstones allowed in an index of `slots` slots before it
/// is rebuilt in place.
#[inline]
pub(crate) fn used_slot_limit(slots: usize) -> usize {
    slots - slots / 8
}

#[cold]
#[inline(never)]
pub(crate) fn capacity_overflow() -> ! {
    panic!("capacity overflow")
}
