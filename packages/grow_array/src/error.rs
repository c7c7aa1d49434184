use std::alloc::Layout;

use thiserror::Error;

/// Errors reported by [`Array`][crate::Array] and [`Allocator`][crate::Allocator]
/// implementations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A bounds-checked access named an index at or beyond the current length.
    #[error("index {index} is out of range for an array of length {len}")]
    OutOfRange {
        /// The index that was requested.
        index: usize,

        /// The length of the array at the time of the access.
        len: usize,
    },

    /// The operation needs at least one element but the array is empty.
    #[error("the array is empty")]
    Empty,

    /// The allocator could not provide the requested storage.
    #[error(
        "failed to allocate {size} bytes aligned to {align}",
        size = .layout.size(),
        align = .layout.align()
    )]
    AllocationFailed {
        /// The layout of the allocation that failed.
        layout: Layout,
    },

    /// The requested capacity cannot be represented as a memory layout on this platform.
    #[error("capacity overflow")]
    CapacityOverflow,
}

/// A specialized `Result` type for array operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
