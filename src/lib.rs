#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[cfg(feature = "log")]
macro_rules! trace {
    ($($arg:tt)*) => {
        log::trace!($($arg)*)
    };
}

#[cfg(not(feature = "log"))]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

pub(crate) use trace;

/// The allocator capability tables allocate through.
pub mod allocator;

pub mod capacity;

pub mod copy_from;

/// Error types for fallible reservation.
pub mod error;

pub mod hash;

/// A hash map with pluggable hash and equality functors and an owned
/// allocator.
///
/// This module provides a `HashMap` that wraps the `HashTable` and supplies
/// hashing and key comparison through its functors.
pub mod hash_map;

/// A hash set layered on `HashMap<T, ()>`.
pub mod hash_set;

pub mod hash_table;

#[cfg(test)]
mod test_util;

pub use allocator::Allocator;
pub use allocator::Global;
pub use copy_from::CopyFrom;
pub use error::TryReserveError;
pub use hash::DefaultEqual;
pub use hash::DefaultHash;
pub use hash::KeyEqual;
pub use hash::KeyHash;
pub use hash_map::Entry;
pub use hash_map::HashMap;
pub use hash_set::HashSet;
pub use hash_table::HashTable;
