use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::{Error, Result};

/// Source of raw storage for [`Array`][crate::Array], and the place where elements are
/// constructed into and destroyed out of that storage.
///
/// The array only ever asks for storage for a non-zero number of elements and always returns
/// it with the same element count it asked for. The `construct()` and `destroy()` hooks have
/// default implementations that write the value in place and run its destructor in place;
/// override them to observe or decorate element lifetimes.
///
/// # Safety
///
/// Memory returned by [`allocate()`][Self::allocate] must be valid for reads and writes of
/// `count` values of `T`, correctly aligned for `T`, and must remain valid and not be handed
/// out again until it is passed to [`deallocate()`][Self::deallocate].
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::ptr::NonNull;
///
/// use grow_array::{Allocator, Array, Global};
///
/// /// Counts the allocations it forwards to the global allocator.
/// #[derive(Default)]
/// struct Counting {
///     allocations: Cell<usize>,
/// }
///
/// // SAFETY: All storage comes from `Global`, which upholds the contract.
/// unsafe impl Allocator for Counting {
///     fn allocate<T>(&self, count: usize) -> Result<NonNull<T>, grow_array::Error> {
///         self.allocations.set(self.allocations.get() + 1);
///         Global.allocate(count)
///     }
///
///     unsafe fn deallocate<T>(&self, ptr: NonNull<T>, count: usize) {
///         // SAFETY: Forwarding the caller's guarantees to the allocator that produced `ptr`.
///         unsafe { Global.deallocate(ptr, count) }
///     }
/// }
///
/// let counting = Counting::default();
/// let mut array = Array::new_in(&counting);
///
/// for value in 0..5 {
///     array.push(value)?;
/// }
///
/// // Capacity went 1 -> 2 -> 4 -> 8.
/// assert_eq!(counting.allocations.get(), 4);
/// # Ok::<(), grow_array::Error>(())
/// ```
pub unsafe trait Allocator {
    /// Obtains uninitialized storage for `count` values of `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] if the storage cannot be provided and
    /// [`Error::CapacityOverflow`] if `count` values of `T` do not fit in a memory layout.
    fn allocate<T>(&self, count: usize) -> Result<NonNull<T>>;

    /// Returns storage obtained from [`allocate()`][Self::allocate].
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate::<T>(count)` on this allocator with the same
    /// `count`, and must not be used afterwards. Any values in the storage are not dropped.
    unsafe fn deallocate<T>(&self, ptr: NonNull<T>, count: usize);

    /// Moves `value` into the uninitialized slot at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a slot inside storage from this allocator that does not currently
    /// hold a live value.
    unsafe fn construct<T>(&self, ptr: NonNull<T>, value: T) {
        // SAFETY: Forwarding the caller's guarantee that the slot is valid and vacant.
        unsafe { ptr.write(value) }
    }

    /// Runs the destructor of the live value at `ptr`, leaving the slot uninitialized.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live value inside storage from this allocator, and the value
    /// must not be used afterwards.
    unsafe fn destroy<T>(&self, ptr: NonNull<T>) {
        // SAFETY: Forwarding the caller's guarantee that the slot holds a live value.
        unsafe { ptr.drop_in_place() }
    }
}

/// Calculates the layout of `count` contiguous values of `T`.
pub(crate) fn array_layout<T>(count: usize) -> Result<Layout> {
    Layout::array::<T>(count).map_err(|_layout_error| Error::CapacityOverflow)
}

/// The process-wide global allocator (whatever `#[global_allocator]` is in effect).
///
/// Requests that amount to zero bytes (zero elements, or zero-sized elements) never reach the
/// global allocator and are satisfied with a dangling, well-aligned pointer.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Global;

// SAFETY: Storage comes straight from the global allocator with the exact array layout, and
// zero-byte requests are served by a dangling pointer that is valid for zero-byte accesses.
unsafe impl Allocator for Global {
    fn allocate<T>(&self, count: usize) -> Result<NonNull<T>> {
        let layout = array_layout::<T>(count)?;

        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }

        // SAFETY: The layout has a non-zero size, checked above.
        let ptr = unsafe { alloc::alloc(layout) };

        NonNull::new(ptr.cast::<T>()).ok_or(Error::AllocationFailed { layout })
    }

    unsafe fn deallocate<T>(&self, ptr: NonNull<T>, count: usize) {
        let layout = array_layout::<T>(count)
            .expect("layout was calculable when the storage was allocated, so it still is");

        if layout.size() == 0 {
            return;
        }

        // SAFETY: The caller guarantees `ptr` came from `allocate()` with the same count, so
        // it was allocated by the global allocator with this exact layout.
        unsafe { alloc::dealloc(ptr.as_ptr().cast(), layout) }
    }
}

// SAFETY: Forwards every operation to the referenced allocator, which upholds the contract.
unsafe impl<A: Allocator + ?Sized> Allocator for &A {
    fn allocate<T>(&self, count: usize) -> Result<NonNull<T>> {
        (**self).allocate(count)
    }

    unsafe fn deallocate<T>(&self, ptr: NonNull<T>, count: usize) {
        // SAFETY: Forwarding the caller's guarantees.
        unsafe { (**self).deallocate(ptr, count) }
    }

    unsafe fn construct<T>(&self, ptr: NonNull<T>, value: T) {
        // SAFETY: Forwarding the caller's guarantees.
        unsafe { (**self).construct(ptr, value) }
    }

    unsafe fn destroy<T>(&self, ptr: NonNull<T>) {
        // SAFETY: Forwarding the caller's guarantees.
        unsafe { (**self).destroy(ptr) }
    }
}
