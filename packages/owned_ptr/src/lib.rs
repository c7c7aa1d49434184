#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Ownership pointers with explicit lifetime rules.
//!
//! This package provides three pointer types that each express one ownership relationship:
//!
//! * [`UniquePtr<T>`] - the sole owner of a heap-allocated object. Cannot be cloned; ownership
//!   moves with [`UniquePtr::take()`] or is given up with [`UniquePtr::release()`].
//! * [`SharedPtr<T>`] - one of possibly many owners of a heap-allocated object. Clones share a
//!   control block with an atomic strong count; the object is destroyed exactly once, when the
//!   last owner goes away.
//! * [`WeakPtr<T>`] - an observer of an object owned by [`SharedPtr`]s. It keeps the control
//!   block alive but not the object, and can be upgraded back into an owner with
//!   [`WeakPtr::lock()`] as long as the object still exists.
//!
//! # Control block lifecycle
//!
//! The first [`SharedPtr`] created from a raw pointer or value allocates a control block that
//! holds the object pointer, the strong count (number of [`SharedPtr`]s) and the weak count
//! (number of [`WeakPtr`]s). The object is destroyed when the strong count reaches zero. The
//! control block is freed only once the weak count reaches zero as well, so observers can keep
//! asking [`WeakPtr::expired()`] after the object is gone.
//!
//! # Null pointers
//!
//! All three types can be null. Dereferencing through `get_ref()` reports
//! [`Error::NullDereference`]; dereferencing through [`Deref`][std::ops::Deref] panics with
//! the same message.
//!
//! # Example
//!
//! ```rust
//! use owned_ptr::{SharedPtr, UniquePtr};
//!
//! let mut unique = UniquePtr::new(vec![1, 2, 3]);
//! unique.push(4);
//! assert_eq!(unique.len(), 4);
//!
//! let shared = SharedPtr::new("hello".to_string());
//! let observer = shared.downgrade();
//!
//! if let Ok(value) = observer.lock().get_ref() {
//!     assert_eq!(value, "hello");
//! }
//!
//! drop(shared);
//! assert!(observer.expired());
//! ```

mod control_block;
mod error;
mod shared_ptr;
mod unique_ptr;
mod weak_ptr;

pub(crate) use control_block::*;
pub use error::*;
pub use shared_ptr::*;
pub use unique_ptr::*;
pub use weak_ptr::*;
