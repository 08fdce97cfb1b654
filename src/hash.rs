//! Hash and equality functors.
//!
//! A map stores one [`KeyHash`] and one [`KeyEqual`] by value. The two must be
//! consistent: whenever `equal.eq(a, b)` holds, `hash.hash(a) == hash.hash(b)`.
//! Plain closures and function pointers work as functors too.

use core::hash::BuildHasher;
use core::hash::Hash;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// Hash state backing [`DefaultHash`].
        pub type DefaultHashState = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// Hash state backing [`DefaultHash`].
        pub type DefaultHashState = std::hash::RandomState;
    } else {
        /// Hash state backing [`DefaultHash`].
        pub type DefaultHashState = core::hash::BuildHasherDefault<FnvHasher>;

        /// 64-bit FNV-1a, used when neither `foldhash` nor `std` is available.
        #[derive(Clone, Copy)]
        pub struct FnvHasher(u64);

        impl Default for FnvHasher {
            fn default() -> Self {
                FnvHasher(0xcbf2_9ce4_8422_2325)
            }
        }

        impl core::hash::Hasher for FnvHasher {
            fn finish(&self) -> u64 {
                self.0
            }

            fn write(&mut self, bytes: &[u8]) {
                for &byte in bytes {
                    self.0 ^= byte as u64;
                    self.0 = self.0.wrapping_mul(0x0100_0000_01b3);
                }
            }
        }
    }
}

/// Hashes keys of type `K` to 64 bits.
pub trait KeyHash<K: ?Sized> {
    /// Returns the hash of `key`.
    fn hash(&self, key: &K) -> u64;
}

/// Decides whether two keys of type `K` are the same key.
pub trait KeyEqual<K: ?Sized> {
    /// Returns `true` if `a` and `b` name the same key.
    fn eq(&self, a: &K, b: &K) -> bool;
}

impl<K, F> KeyHash<K> for F
where
    K: ?Sized,
    F: Fn(&K) -> u64,
{
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        self(key)
    }
}

impl<K, F> KeyEqual<K> for F
where
    K: ?Sized,
    F: Fn(&K, &K) -> bool,
{
    #[inline]
    fn eq(&self, a: &K, b: &K) -> bool {
        self(a, b)
    }
}

/// Hashes any [`Hash`] key through a [`BuildHasher`].
///
/// With the default features this is foldhash's randomly seeded fast hasher.
/// Each default-constructed value picks its own seed, which is why copies
/// between maps always recompute hashes.
#[derive(Clone, Debug, Default)]
pub struct DefaultHash<S = DefaultHashState> {
    state: S,
}

impl<S> DefaultHash<S> {
    /// Wraps an existing hasher builder.
    pub fn with_state(state: S) -> Self {
        Self { state }
    }

    /// Returns the wrapped hasher builder.
    pub fn state(&self) -> &S {
        &self.state
    }
}

impl<K, S> KeyHash<K> for DefaultHash<S>
where
    K: Hash + ?Sized,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        self.state.hash_one(key)
    }
}

/// Compares keys with [`Eq`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefaultEqual;

impl<K> KeyEqual<K> for DefaultEqual
where
    K: Eq + ?Sized,
{
    #[inline]
    fn eq(&self, a: &K, b: &K) -> bool {
        a == b
    }
}
