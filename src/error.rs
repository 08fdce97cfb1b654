use core::alloc::Layout;

/// The allocator could not satisfy a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("memory allocation failed")]
pub struct AllocError;

/// The error type for [`try_reserve`] methods.
///
/// [`try_reserve`]: crate::HashMap::try_reserve
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TryReserveError {
    /// The requested element count does not fit the table's size arithmetic.
    #[error("capacity overflow")]
    CapacityOverflow,

    /// The allocator returned an error for the table layout.
    #[error("memory allocation of {} bytes failed", layout.size())]
    AllocError {
        /// The layout of the rejected allocation request.
        layout: Layout,
    },
}
