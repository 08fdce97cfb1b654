//! Copy construction across (possibly distinct) key and value types.
//!
//! Copying a table walks every occupied bucket. When both the key and the value
//! conversion are plain byte duplication, the whole occupied region is copied
//! with a single block copy instead. Which path runs is decided by associated
//! constants, so the choice is made per monomorphization and the other branch
//! is compiled out.

use core::marker::PhantomData;
use core::mem;

/// Construct `Self` as a copy of a `Src`.
///
/// This is the copy-constructor hook used by [`HashMap::copy_from`] and
/// friends. Most implementations just clone; the [`copy_from_clone!`] macro
/// writes those without any `unsafe` at the call site.
///
/// # Safety
///
/// Implementations that leave [`BITWISE`] at `false` have no extra
/// obligations.
///
/// Setting [`BITWISE`] to `true` asserts that duplicating the bytes of any
/// valid `Src` yields a valid `Self` that is indistinguishable from the result
/// of [`copy_from`]. Size, alignment and the absence of drop glue are checked
/// at compile time; bit-validity is not.
///
/// [`HashMap::copy_from`]: crate::HashMap::copy_from
/// [`BITWISE`]: CopyFrom::BITWISE
/// [`copy_from`]: CopyFrom::copy_from
pub unsafe trait CopyFrom<Src>: Sized {
    /// Whether a byte copy of a `Src` is a valid copy.
    const BITWISE: bool = false;

    /// Builds a copy of `src`.
    fn copy_from(src: &Src) -> Self;
}

/// Implements [`CopyFrom<Self>`] for `Clone` types through [`Clone::clone`].
///
/// ```rust
/// use alloc_hash::copy_from::CopyFrom;
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Name(String);
///
/// alloc_hash::copy_from_clone!(Name);
///
/// let name = Name("ada".to_string());
/// assert_eq!(Name::copy_from(&name), name);
/// ```
#[macro_export]
macro_rules! copy_from_clone {
    ($($ty:ty),+ $(,)?) => {
        $(
            // SAFETY: Leaves `BITWISE` false.
            unsafe impl $crate::copy_from::CopyFrom<$ty> for $ty {
                #[inline]
                fn copy_from(src: &$ty) -> Self {
                    ::core::clone::Clone::clone(src)
                }
            }
        )+
    };
}

macro_rules! bitwise_copy_from {
    ($($src:ty => $dst:ty),+ $(,)?) => {
        $(
            // SAFETY: Same size and alignment, no drop glue, and every bit
            // pattern of `$src` is a valid `$dst` equal to the `as` cast.
            unsafe impl CopyFrom<$src> for $dst {
                const BITWISE: bool = true;

                #[inline]
                fn copy_from(src: &$src) -> Self {
                    *src as $dst
                }
            }
        )+
    };
}

macro_rules! bitwise_copy_self {
    ($($ty:ty),+ $(,)?) => {
        $(
            // SAFETY: `Copy` types without drop glue copy by bytes.
            unsafe impl CopyFrom<$ty> for $ty {
                const BITWISE: bool = true;

                #[inline]
                fn copy_from(src: &$ty) -> Self {
                    *src
                }
            }
        )+
    };
}

macro_rules! widening_copy_from {
    ($($src:ty => $dst:ty),+ $(,)?) => {
        $(
            // SAFETY: Leaves `BITWISE` false.
            unsafe impl CopyFrom<$src> for $dst {
                #[inline]
                fn copy_from(src: &$src) -> Self {
                    <$dst>::from(*src)
                }
            }
        )+
    };
}

bitwise_copy_self!(
    (), bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
);

bitwise_copy_from!(
    i8 => u8, u8 => i8,
    i16 => u16, u16 => i16,
    i32 => u32, u32 => i32,
    i64 => u64, u64 => i64,
    i128 => u128, u128 => i128,
    isize => usize, usize => isize,
);

widening_copy_from!(
    u8 => u16, u8 => u32, u8 => u64, u16 => u32, u16 => u64, u32 => u64,
    i8 => i16, i8 => i32, i8 => i64, i16 => i32, i16 => i64, i32 => i64,
    f32 => f64,
);

// SAFETY: Shared references are `Copy` and carry no drop glue.
unsafe impl<'a, T: ?Sized> CopyFrom<&'a T> for &'a T {
    const BITWISE: bool = true;

    #[inline]
    fn copy_from(src: &&'a T) -> Self {
        *src
    }
}

// SAFETY: Leaves `BITWISE` false.
unsafe impl CopyFrom<alloc::string::String> for alloc::string::String {
    #[inline]
    fn copy_from(src: &alloc::string::String) -> Self {
        src.clone()
    }
}

// SAFETY: Leaves `BITWISE` false.
unsafe impl CopyFrom<&str> for alloc::string::String {
    #[inline]
    fn copy_from(src: &&str) -> Self {
        alloc::string::String::from(*src)
    }
}

// SAFETY: Leaves `BITWISE` false.
unsafe impl<T: Clone> CopyFrom<alloc::vec::Vec<T>> for alloc::vec::Vec<T> {
    #[inline]
    fn copy_from(src: &alloc::vec::Vec<T>) -> Self {
        src.clone()
    }
}

// SAFETY: Leaves `BITWISE` false.
unsafe impl<T: Clone> CopyFrom<alloc::boxed::Box<T>> for alloc::boxed::Box<T> {
    #[inline]
    fn copy_from(src: &alloc::boxed::Box<T>) -> Self {
        src.clone()
    }
}

// SAFETY: Leaves `BITWISE` false; `Option` layout depends on niches, so the
// payload's bitwise flag does not carry over.
unsafe impl<S, T: CopyFrom<S>> CopyFrom<Option<S>> for Option<T> {
    #[inline]
    fn copy_from(src: &Option<S>) -> Self {
        src.as_ref().map(T::copy_from)
    }
}

/// Compile-time gate for the block-copy path between `Src` and `Dst`.
pub(crate) struct Relocatable<Src, Dst>(PhantomData<(Src, Dst)>);

impl<Src, Dst: CopyFrom<Src>> Relocatable<Src, Dst> {
    /// `Dst::BITWISE`, after checking that the claim is layout-compatible.
    ///
    /// An impl that opts into `BITWISE` with a mismatched layout fails to
    /// compile here rather than misbehaving at run time.
    pub(crate) const BITWISE: bool = {
        if Dst::BITWISE {
            assert!(
                mem::size_of::<Src>() == mem::size_of::<Dst>(),
                "bitwise CopyFrom between types of different size"
            );
            assert!(
                mem::align_of::<Src>() == mem::align_of::<Dst>(),
                "bitwise CopyFrom between types of different alignment"
            );
            assert!(
                !mem::needs_drop::<Src>() && !mem::needs_drop::<Dst>(),
                "bitwise CopyFrom between types with drop glue"
            );
        }
        Dst::BITWISE
    };
}

/// Whether buckets holding `(K2, V2)` can be block-copied into buckets holding
/// `(K, V)`.
#[inline(always)]
pub const fn bitwise_relocatable<K2, V2, K, V>() -> bool
where
    K: CopyFrom<K2>,
    V: CopyFrom<V2>,
{
    Relocatable::<K2, K>::BITWISE && Relocatable::<V2, V>::BITWISE
}
