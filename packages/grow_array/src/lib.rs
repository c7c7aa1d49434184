#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A growable contiguous array with a pluggable allocator.
//!
//! [`Array<T, A>`] keeps its elements in one contiguous buffer. The buffer is obtained from an
//! [`Allocator`], which is also responsible for constructing elements into the buffer and
//! destroying them again. The default allocator, [`Global`], uses the process-wide global
//! allocator and constructs/destroys values in place.
//!
//! # Growth
//!
//! Appending to a full array doubles its capacity (starting at 1), moves the existing elements
//! into the new buffer and returns the old buffer to the allocator. Capacity only shrinks when
//! explicitly requested via [`Array::shrink_to_fit()`].
//!
//! # Errors
//!
//! Accessors report [`Error::OutOfRange`] and [`Error::Empty`]. Anything that allocates
//! reports [`Error::AllocationFailed`] or [`Error::CapacityOverflow`], and leaves the array
//! unchanged when it does.
//!
//! # Example
//!
//! ```rust
//! use grow_array::Array;
//!
//! let mut squares = Array::new();
//!
//! for n in 1..=4 {
//!     squares.push(n * n)?;
//! }
//!
//! assert_eq!(squares, [1, 4, 9, 16]);
//! assert_eq!(squares.pop_value()?, 16);
//!
//! squares.pop()?;
//! assert_eq!(squares.iter().rev().copied().collect::<Vec<_>>(), [4, 1]);
//! # Ok::<(), grow_array::Error>(())
//! ```

mod allocator;
mod array;
mod error;

pub use allocator::*;
pub use array::*;
pub use error::*;
