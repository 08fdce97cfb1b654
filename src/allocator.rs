use core::alloc::Layout;
use core::ptr::NonNull;

use crate::error::AllocError;

/// A source of raw memory for a table.
///
/// Tables own their allocator by value and route every allocation and free
/// through it. Two allocator values (possibly of different types) that compare
/// equal through [`PartialEq`] must be able to free each other's memory; this
/// is what lets [`HashMap::relocate_in`] adopt a buffer instead of copying it.
///
/// The alignment requirement travels inside [`Layout`], so there is no
/// separate aligned entry point.
///
/// # Safety
///
/// - `allocate` must return a block that is valid for reads and writes of
///   `layout.size()` bytes and aligned to `layout.align()`, or an error.
/// - A block stays valid until it is passed to `deallocate` on this allocator
///   or on one that compares equal to it.
///
/// [`HashMap::relocate_in`]: crate::HashMap::relocate_in
pub unsafe trait Allocator {
    /// Allocates a block described by `layout`.
    ///
    /// `layout.size()` is never zero when called by this crate.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Returns a block previously obtained from [`allocate`].
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate` on this allocator (or one equal to it)
    /// called with the same `layout`, and must not have been freed already.
    ///
    /// [`allocate`]: Allocator::allocate
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Allocates a block and fills it with zeroes.
    fn allocate_zeroed(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        let ptr = self.allocate(layout)?;
        // SAFETY: `allocate` returned a block of at least `layout.size()` bytes.
        unsafe { core::ptr::write_bytes(ptr.as_ptr(), 0, layout.size()) };
        Ok(ptr)
    }
}

// SAFETY: Forwards to `A`, which upholds the contract.
unsafe impl<A> Allocator for &A
where
    A: Allocator + ?Sized,
{
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        (**self).allocate(layout)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: Caller upholds the contract for `A`.
        unsafe { (**self).deallocate(ptr, layout) }
    }
}

/// The global memory allocator.
///
/// All `Global` values are interchangeable and compare equal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Global;

// SAFETY: Forwards to the registered global allocator.
unsafe impl Allocator for Global {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        debug_assert!(layout.size() != 0);
        // SAFETY: This crate never requests zero-sized blocks.
        let raw = unsafe { alloc::alloc::alloc(layout) };
        NonNull::new(raw).ok_or(AllocError)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: Caller guarantees `ptr` came from `alloc` with `layout`.
        unsafe { alloc::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

impl PartialEq<&Global> for Global {
    #[inline]
    fn eq(&self, _: &&Global) -> bool {
        true
    }
}
