use std::alloc;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};
use std::ptr::{self, NonNull};
use std::slice;

use crate::{Allocator, Error, Global, Result};

/// A growable, contiguous array of `T` whose storage comes from an [`Allocator`].
///
/// The first `len()` slots of the buffer always hold live values and the remaining
/// `capacity() - len()` slots are uninitialized. Elements enter the buffer through
/// [`Allocator::construct()`] and leave it through [`Allocator::destroy()`], except when they
/// are moved out by [`pop_value()`][Self::pop_value] or moved between buffers during growth.
///
/// Capacity grows on demand by doubling, starting at 1, which makes [`push()`][Self::push]
/// amortized O(1). Capacity never shrinks implicitly; use [`shrink_to_fit()`][Self::shrink_to_fit]
/// to give memory back.
///
/// # Accessing elements
///
/// There are three ways to read an element by index:
///
/// * [`at()`][Self::at] checks the index and returns [`Error::OutOfRange`] on failure.
/// * `array[index]` checks the index and panics on failure.
/// * [`get_unchecked()`][Self::get_unchecked] does not check the index at all.
///
/// # Errors
///
/// Every operation that may allocate returns a [`Result`][std::result::Result] and reports
/// [`Error::AllocationFailed`] or [`Error::CapacityOverflow`] if it cannot obtain storage. The
/// array is left unchanged when that happens.
///
/// # Example
///
/// ```rust
/// use grow_array::{Array, Error};
///
/// let mut array = Array::new();
/// array.push(1)?;
/// array.push(2)?;
/// array.push(3)?;
///
/// assert_eq!(array.len(), 3);
/// assert_eq!(*array.at(2)?, 3);
/// assert!(matches!(array.at(3), Err(Error::OutOfRange { index: 3, len: 3 })));
///
/// array.resize(1, 0)?;
/// assert_eq!(array, [1]);
/// # Ok::<(), Error>(())
/// ```
pub struct Array<T, A: Allocator = Global> {
    ptr: NonNull<T>,

    len: usize,

    capacity: usize,

    allocator: A,

    _owns: PhantomData<T>,
}

impl<T> Array<T> {
    /// Creates an empty array backed by the [`Global`] allocator.
    ///
    /// Does not allocate until the first element is added.
    #[must_use]
    pub const fn new() -> Self {
        Self::new_in(Global)
    }

    /// Creates an empty array with room for exactly `capacity` elements, backed by the
    /// [`Global`] allocator.
    ///
    /// # Errors
    ///
    /// Returns an allocation error if the storage cannot be obtained.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_capacity_in(capacity, Global)
    }

    /// Creates an array holding `len` clones of `value`, backed by the [`Global`] allocator.
    ///
    /// # Errors
    ///
    /// Returns an allocation error if the storage cannot be obtained.
    pub fn from_elem(len: usize, value: T) -> Result<Self>
    where
        T: Clone,
    {
        Self::from_elem_in(len, value, Global)
    }
}

impl<T, A: Allocator> Array<T, A> {
    /// Creates an empty array that obtains storage from `allocator`.
    ///
    /// Does not allocate until the first element is added.
    #[must_use]
    pub const fn new_in(allocator: A) -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            capacity: 0,
            allocator,
            _owns: PhantomData,
        }
    }

    /// Creates an empty array with room for exactly `capacity` elements, obtaining storage
    /// from `allocator`.
    ///
    /// # Errors
    ///
    /// Returns an allocation error if the storage cannot be obtained.
    pub fn with_capacity_in(capacity: usize, allocator: A) -> Result<Self> {
        let mut array = Self::new_in(allocator);
        array.reserve(capacity)?;
        Ok(array)
    }

    /// Creates an array holding `len` clones of `value`, obtaining storage from `allocator`.
    ///
    /// # Errors
    ///
    /// Returns an allocation error if the storage cannot be obtained.
    pub fn from_elem_in(len: usize, value: T, allocator: A) -> Result<Self>
    where
        T: Clone,
    {
        let mut array = Self::with_capacity_in(len, allocator)?;
        array.resize(len, value)?;
        Ok(array)
    }

    /// Number of live elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Number of elements the current buffer can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the array has no elements. It may still have a buffer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The allocator that provides this array's storage.
    #[must_use]
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Pointer to the first element.
    ///
    /// The pointer is dangling (but well-aligned) when the array has no buffer. It is
    /// invalidated by any operation that reallocates.
    #[must_use]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// The live elements as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: The first `len` slots hold live values and the pointer is well-aligned and
        // non-null even when there is no buffer.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// The live elements as a mutable slice.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: As in `as_slice()`, and `&mut self` guarantees exclusive access.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Returns the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `index >= len()`.
    pub fn at(&self, index: usize) -> Result<&T> {
        let len = self.len;

        self.as_slice()
            .get(index)
            .ok_or(Error::OutOfRange { index, len })
    }

    /// Returns the element at `index` for modification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `index >= len()`.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.len;

        self.as_mut_slice()
            .get_mut(index)
            .ok_or(Error::OutOfRange { index, len })
    }

    /// Returns the element at `index` without checking that it exists.
    ///
    /// # Safety
    ///
    /// `index` must be less than [`len()`][Self::len].
    #[must_use]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        // SAFETY: Forwarding the caller's guarantee that the index is in bounds.
        unsafe { self.as_slice().get_unchecked(index) }
    }

    /// Returns the element at `index` for modification without checking that it exists.
    ///
    /// # Safety
    ///
    /// `index` must be less than [`len()`][Self::len].
    #[must_use]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        // SAFETY: Forwarding the caller's guarantee that the index is in bounds.
        unsafe { self.as_mut_slice().get_unchecked_mut(index) }
    }

    /// The first element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] if the array has no elements.
    pub fn front(&self) -> Result<&T> {
        self.as_slice().first().ok_or(Error::Empty)
    }

    /// The first element, for modification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] if the array has no elements.
    pub fn front_mut(&mut self) -> Result<&mut T> {
        self.as_mut_slice().first_mut().ok_or(Error::Empty)
    }

    /// The last element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] if the array has no elements.
    pub fn back(&self) -> Result<&T> {
        self.as_slice().last().ok_or(Error::Empty)
    }

    /// The last element, for modification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] if the array has no elements.
    pub fn back_mut(&mut self) -> Result<&mut T> {
        self.as_mut_slice().last_mut().ok_or(Error::Empty)
    }

    /// Iterates over the elements in index order.
    ///
    /// The iterator is double-ended, so `iter().rev()` walks the array back to front.
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Iterates over the elements in index order, allowing each to be modified.
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// Appends `value` after the last element.
    ///
    /// If the buffer is full, its capacity doubles (or becomes 1 if there was no buffer) and
    /// the existing elements are moved to the new buffer before the old one is released.
    ///
    /// # Errors
    ///
    /// Returns an allocation error if the buffer needed to grow and the storage could not be
    /// obtained. The array is unchanged and `value` is dropped.
    pub fn push(&mut self, value: T) -> Result<()> {
        let required = self.len.checked_add(1).ok_or(Error::CapacityOverflow)?;
        self.grow_to_fit(required)?;

        // SAFETY: The buffer was grown above if it was full.
        unsafe { self.push_within_capacity(value) };

        Ok(())
    }

    /// Destroys the last element and removes it from the array.
    ///
    /// The element goes through the allocator's [`destroy()`][Allocator::destroy], like every
    /// other element removal. Use [`pop_value()`][Self::pop_value] to take the value instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] if the array has no elements.
    pub fn pop(&mut self) -> Result<()> {
        let last = self.len.checked_sub(1).ok_or(Error::Empty)?;

        // The slot leaves the live range before its destructor runs.
        self.len = last;

        // SAFETY: `last` is below the old length, so it is within the buffer.
        let slot = unsafe { self.slot(last) };

        // SAFETY: The slot held a live value that is no longer reachable through the array.
        unsafe { self.allocator.destroy(slot) };

        Ok(())
    }

    /// Removes the last element and returns it.
    ///
    /// The value is moved out to the caller, so the allocator's
    /// [`destroy()`][Allocator::destroy] is never called for it. An allocator that pairs
    /// `construct()` with `destroy()` sees one construct without a matching destroy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] if the array has no elements.
    pub fn pop_value(&mut self) -> Result<T> {
        let last = self.len.checked_sub(1).ok_or(Error::Empty)?;

        // The slot leaves the live range before we read from it.
        self.len = last;

        // SAFETY: `last` is below the old length, so it is within the buffer.
        let slot = unsafe { self.slot(last) };

        // SAFETY: The slot held a live value and is no longer reachable through the array, so
        // ownership of the value moves to the caller.
        Ok(unsafe { slot.read() })
    }

    /// Ensures the buffer can hold at least `capacity` elements.
    ///
    /// If the current capacity is smaller, the buffer is reallocated to exactly `capacity`
    /// elements. The length never changes.
    ///
    /// # Errors
    ///
    /// Returns an allocation error if the storage cannot be obtained.
    pub fn reserve(&mut self, capacity: usize) -> Result<()> {
        if capacity <= self.capacity {
            return Ok(());
        }

        self.reallocate(capacity)
    }

    /// Changes the length to `new_len`.
    ///
    /// Shrinking destroys the trailing elements. Growing appends clones of `value`, reserving
    /// exactly `new_len` slots first if the buffer is too small.
    ///
    /// # Errors
    ///
    /// Returns an allocation error if the buffer needed to grow and the storage could not be
    /// obtained. The array is unchanged when that happens.
    pub fn resize(&mut self, new_len: usize, value: T) -> Result<()>
    where
        T: Clone,
    {
        if new_len <= self.len {
            self.truncate(new_len);
            return Ok(());
        }

        self.reserve(new_len)?;

        let last = new_len
            .checked_sub(1)
            .expect("guarded by new_len > len above");

        while self.len < last {
            // SAFETY: We reserved `new_len` slots and `len < last < new_len`.
            unsafe { self.push_within_capacity(value.clone()) };
        }

        // SAFETY: We reserved `new_len` slots and `len == last < new_len`.
        unsafe { self.push_within_capacity(value) };

        Ok(())
    }

    /// Changes the length to `new_len`, appending default values when growing.
    ///
    /// # Errors
    ///
    /// Returns an allocation error if the buffer needed to grow and the storage could not be
    /// obtained.
    pub fn resize_default(&mut self, new_len: usize) -> Result<()>
    where
        T: Default,
    {
        self.resize_with(new_len, T::default)
    }

    /// Changes the length to `new_len`, appending values returned by `f` when growing.
    ///
    /// # Errors
    ///
    /// Returns an allocation error if the buffer needed to grow and the storage could not be
    /// obtained.
    pub fn resize_with<F>(&mut self, new_len: usize, mut f: F) -> Result<()>
    where
        F: FnMut() -> T,
    {
        if new_len <= self.len {
            self.truncate(new_len);
            return Ok(());
        }

        self.reserve(new_len)?;

        while self.len < new_len {
            // SAFETY: We reserved `new_len` slots and `len < new_len`.
            unsafe { self.push_within_capacity(f()) };
        }

        Ok(())
    }

    /// Destroys every element from `new_len` onwards, back to front.
    ///
    /// Does nothing if `new_len >= len()`. The capacity is unchanged.
    pub fn truncate(&mut self, new_len: usize) {
        while self.len > new_len {
            // Each slot leaves the live range before its destructor runs, so a panicking
            // destructor leaks the rest instead of dropping anything twice.
            self.len = self
                .len
                .checked_sub(1)
                .expect("guarded by len > new_len above");

            // SAFETY: The index is below the old length, so it is within the buffer.
            let slot = unsafe { self.slot(self.len) };

            // SAFETY: The slot held a live value that is no longer reachable through the array.
            unsafe { self.allocator.destroy(slot) };
        }
    }

    /// Destroys all elements. The capacity is unchanged.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Reallocates the buffer to hold exactly `len()` elements.
    ///
    /// An empty array releases its buffer entirely and ends up with zero capacity.
    ///
    /// # Errors
    ///
    /// Returns an allocation error if the smaller buffer cannot be obtained. The array keeps
    /// its current buffer when that happens.
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        if self.capacity == self.len {
            return Ok(());
        }

        self.reallocate(self.len)
    }

    /// Creates a deep copy whose capacity equals the length of this array.
    ///
    /// # Errors
    ///
    /// Returns an allocation error if the storage for the copy cannot be obtained.
    pub fn try_clone(&self) -> Result<Self>
    where
        T: Clone,
        A: Clone,
    {
        let mut copy = Self::with_capacity_in(self.len, self.allocator.clone())?;

        for value in self.as_slice() {
            // SAFETY: The copy has room for exactly `self.len` elements and receives that many.
            unsafe { copy.push_within_capacity(value.clone()) };
        }

        Ok(copy)
    }

    /// Grows the buffer so it holds at least `required` elements.
    ///
    /// Growth doubles the capacity (starting at 1), or jumps straight to `required` if doubling
    /// is not enough. Does nothing if the buffer is already large enough.
    fn grow_to_fit(&mut self, required: usize) -> Result<()> {
        if required <= self.capacity {
            return Ok(());
        }

        let doubled = if self.capacity == 0 {
            1
        } else {
            self.capacity
                .checked_mul(2)
                .ok_or(Error::CapacityOverflow)?
        };

        self.reallocate(doubled.max(required))
    }

    /// Constructs `value` in the first vacant slot.
    ///
    /// # Safety
    ///
    /// `len()` must be less than `capacity()`.
    unsafe fn push_within_capacity(&mut self, value: T) {
        debug_assert!(self.len < self.capacity);

        // SAFETY: Forwarding the caller's guarantee that `len < capacity`.
        let slot = unsafe { self.slot(self.len) };

        // SAFETY: Slots at and beyond `len` are vacant.
        unsafe { self.allocator.construct(slot, value) };

        // Only counted once construction succeeded, so a panic in `construct()` leaves the
        // array consistent.
        self.len = self
            .len
            .checked_add(1)
            .expect("guarded by len < capacity");
    }

    /// Pointer to the slot at `index`.
    ///
    /// # Safety
    ///
    /// `index` must not exceed `capacity()`.
    unsafe fn slot(&self, index: usize) -> NonNull<T> {
        debug_assert!(index <= self.capacity);

        // SAFETY: Forwarding the caller's guarantee that the offset stays within (or one past
        // the end of) the buffer.
        unsafe { self.ptr.add(index) }
    }

    /// Moves the live elements into a new buffer of exactly `new_capacity` slots and releases
    /// the old buffer. A new capacity of zero means "no buffer".
    fn reallocate(&mut self, new_capacity: usize) -> Result<()> {
        debug_assert!(new_capacity >= self.len);

        let new_ptr = if new_capacity == 0 {
            NonNull::dangling()
        } else {
            self.allocator.allocate::<T>(new_capacity)?
        };

        // SAFETY: Both buffers hold at least `len` slots and are distinct allocations. This is
        // a move: the old slots are treated as vacant from here on.
        unsafe {
            ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr.as_ptr(), self.len);
        }

        self.release_buffer();

        self.ptr = new_ptr;
        self.capacity = new_capacity;

        Ok(())
    }

    /// Returns the current buffer to the allocator without touching any elements in it.
    fn release_buffer(&mut self) {
        if self.capacity == 0 {
            return;
        }

        // SAFETY: A non-zero capacity means the buffer came from `allocate()` with exactly this
        // count, and the caller replaces or forgets the pointer right after this.
        unsafe { self.allocator.deallocate(self.ptr, self.capacity) };

        self.ptr = NonNull::dangling();
        self.capacity = 0;
    }
}

/// Unwraps the result of an allocating operation inside a trait method that cannot return
/// an error, mirroring what the standard collections do.
#[cfg_attr(test, mutants::skip)] // Both failure paths end the test process or thread.
fn expect_allocation<R>(result: Result<R>) -> R {
    match result {
        Ok(value) => value,
        Err(Error::AllocationFailed { layout }) => alloc::handle_alloc_error(layout),
        Err(error) => panic!("{error}"),
    }
}

impl<T, A: Allocator> Drop for Array<T, A> {
    fn drop(&mut self) {
        self.clear();
        self.release_buffer();
    }
}

impl<T, A: Allocator + Default> Default for Array<T, A> {
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for Array<T, A> {
    fn clone(&self) -> Self {
        expect_allocation(self.try_clone())
    }
}

impl<T, A: Allocator> Index<usize> for Array<T, A> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `index >= len()`.
    fn index(&self, index: usize) -> &Self::Output {
        match self.at(index) {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        }
    }
}

impl<T, A: Allocator> IndexMut<usize> for Array<T, A> {
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        match self.at_mut(index) {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        }
    }
}

impl<T, A: Allocator> Extend<T> for Array<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower_bound, _) = iter.size_hint();

        expect_allocation(
            self.len
                .checked_add(lower_bound)
                .ok_or(Error::CapacityOverflow)
                .and_then(|required| self.grow_to_fit(required)),
        );

        for value in iter {
            expect_allocation(self.push(value));
        }
    }
}

impl<T, A: Allocator + Default> FromIterator<T> for Array<T, A> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = Self::default();
        array.extend(iter);
        array
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a Array<T, A> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut Array<T, A> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T, A: Allocator> AsRef<[T]> for Array<T, A> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: Allocator> AsMut<[T]> for Array<T, A> {
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: PartialEq, A: Allocator, B: Allocator> PartialEq<Array<T, B>> for Array<T, A> {
    fn eq(&self, other: &Array<T, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, A: Allocator> Eq for Array<T, A> {}

impl<T: PartialEq, A: Allocator> PartialEq<[T]> for Array<T, A> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq, A: Allocator, const N: usize> PartialEq<[T; N]> for Array<T, A> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for Array<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

// SAFETY: The array owns its elements and its allocator, so moving it to another thread moves
// those along with it.
unsafe impl<T: Send, A: Allocator + Send> Send for Array<T, A> {}

// SAFETY: Shared access only hands out `&T` and `&A`.
unsafe impl<T: Sync, A: Allocator + Sync> Sync for Array<T, A> {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;
    use std::iter;
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};
    use testing::DropTracker;

    use super::*;
    use crate::array_layout;

    assert_impl_all!(Array<u32>: Send, Sync, Clone, Default, fmt::Debug);
    assert_not_impl_any!(Array<Rc<u32>>: Send, Sync);
    assert_not_impl_any!(Array<Cell<u32>>: Sync);

    /// Forwards to `Global` and counts every call.
    #[derive(Debug, Default)]
    struct Tracking {
        allocations: Cell<usize>,
        deallocations: Cell<usize>,
        constructs: Cell<usize>,
        destroys: Cell<usize>,
        last_allocation_count: Cell<usize>,
    }

    impl Tracking {
        fn bump(counter: &Cell<usize>) {
            counter.set(counter.get() + 1);
        }
    }

    // SAFETY: All storage comes from `Global`.
    unsafe impl Allocator for Tracking {
        fn allocate<T>(&self, count: usize) -> Result<NonNull<T>> {
            Self::bump(&self.allocations);
            self.last_allocation_count.set(count);
            Global.allocate(count)
        }

        unsafe fn deallocate<T>(&self, ptr: NonNull<T>, count: usize) {
            Self::bump(&self.deallocations);

            // SAFETY: Forwarding the caller's guarantees.
            unsafe { Global.deallocate(ptr, count) }
        }

        unsafe fn construct<T>(&self, ptr: NonNull<T>, value: T) {
            Self::bump(&self.constructs);

            // SAFETY: Forwarding the caller's guarantees.
            unsafe { Global.construct(ptr, value) }
        }

        unsafe fn destroy<T>(&self, ptr: NonNull<T>) {
            Self::bump(&self.destroys);

            // SAFETY: Forwarding the caller's guarantees.
            unsafe { Global.destroy(ptr) }
        }
    }

    /// Serves a fixed number of allocations from `Global`, then fails every request.
    #[derive(Debug)]
    struct Limited {
        remaining: Cell<usize>,
    }

    impl Limited {
        fn new(allocations: usize) -> Self {
            Self {
                remaining: Cell::new(allocations),
            }
        }
    }

    // SAFETY: All storage comes from `Global`.
    unsafe impl Allocator for Limited {
        fn allocate<T>(&self, count: usize) -> Result<NonNull<T>> {
            let layout = array_layout::<T>(count)?;

            match self.remaining.get().checked_sub(1) {
                Some(remaining) => {
                    self.remaining.set(remaining);
                    Global.allocate(count)
                }
                None => Err(Error::AllocationFailed { layout }),
            }
        }

        unsafe fn deallocate<T>(&self, ptr: NonNull<T>, count: usize) {
            // SAFETY: Forwarding the caller's guarantees.
            unsafe { Global.deallocate(ptr, count) }
        }
    }

    #[test]
    fn new_is_empty_without_buffer() {
        let array = Array::<u32>::new();

        assert!(array.is_empty());
        assert_eq!(array.len(), 0);
        assert_eq!(array.capacity(), 0);
        assert_eq!(array.as_slice(), &[] as &[u32]);
    }

    #[test]
    fn new_does_not_allocate() {
        let tracking = Tracking::default();
        let array = Array::<u32, _>::new_in(&tracking);

        drop(array);

        assert_eq!(tracking.allocations.get(), 0);
        assert_eq!(tracking.deallocations.get(), 0);
    }

    #[test]
    fn push_doubles_capacity_from_one() {
        let mut array = Array::new();
        let mut capacities = Vec::new();

        for value in 0..9 {
            array.push(value).unwrap();
            capacities.push(array.capacity());
        }

        assert_eq!(capacities, [1, 2, 4, 4, 8, 8, 8, 8, 16]);
        assert_eq!(array, [0, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn push_preserves_order_across_growth() {
        let mut array = Array::new();

        for value in 0..1000 {
            array.push(value).unwrap();
            assert!(array.len() <= array.capacity());
        }

        assert!(array.iter().copied().eq(0..1000));
    }

    #[test]
    fn push_goes_through_allocator() {
        let tracking = Tracking::default();

        {
            let mut array = Array::new_in(&tracking);

            for value in 0..5 {
                array.push(value).unwrap();
            }

            assert_eq!(tracking.constructs.get(), 5);
            assert_eq!(tracking.allocations.get(), 4);
            assert_eq!(tracking.deallocations.get(), 3);
        }

        assert_eq!(tracking.destroys.get(), 5);
        assert_eq!(tracking.deallocations.get(), 4);
    }

    #[test]
    fn push_allocation_failure_leaves_array_intact() {
        let limited = Limited::new(1);
        let mut array = Array::new_in(&limited);

        array.push(1).unwrap();

        let error = array.push(2).unwrap_err();

        assert!(matches!(error, Error::AllocationFailed { .. }));
        assert_eq!(array, [1]);
        assert_eq!(array.capacity(), 1);
    }

    #[test]
    fn pop_destroys_through_allocator() {
        let tracker = DropTracker::new();
        let tracking = Tracking::default();

        {
            let mut array = Array::new_in(&tracking);

            array.push(tracker.track(1)).unwrap();
            array.push(tracker.track(2)).unwrap();

            array.pop().unwrap();

            assert_eq!(array.len(), 1);
            assert_eq!(*array[0].value(), 1);
            assert_eq!(tracker.drop_count(), 1);
            assert_eq!(tracking.destroys.get(), 1);
        }

        assert_eq!(tracking.constructs.get(), 2);
        assert_eq!(tracking.destroys.get(), 2);
        assert_eq!(tracker.drop_count(), 2);
    }

    #[test]
    fn pop_value_returns_last_without_destroying() {
        let tracker = DropTracker::new();
        let tracking = Tracking::default();
        let mut array = Array::new_in(&tracking);

        array.push(tracker.track(1)).unwrap();
        array.push(tracker.track(2)).unwrap();

        let popped = array.pop_value().unwrap();

        assert_eq!(*popped.value(), 2);
        assert_eq!(array.len(), 1);
        assert_eq!(tracker.drop_count(), 0);
        assert_eq!(tracking.destroys.get(), 0);

        drop(popped);
        assert_eq!(tracker.drop_count(), 1);
        assert_eq!(tracking.destroys.get(), 0);
    }

    #[test]
    fn pop_empty_fails() {
        let mut array = Array::<u32>::new();

        assert_eq!(array.pop(), Err(Error::Empty));
        assert_eq!(array.pop_value(), Err(Error::Empty));
    }

    #[test]
    fn at_checks_bounds() {
        let mut array = Array::from_elem(3, 7).unwrap();

        assert_eq!(array.at(2), Ok(&7));
        assert_eq!(array.at(3), Err(Error::OutOfRange { index: 3, len: 3 }));

        *array.at_mut(0).unwrap() = 1;
        assert_eq!(array, [1, 7, 7]);
        assert_eq!(
            array.at_mut(10),
            Err(Error::OutOfRange { index: 10, len: 3 })
        );
    }

    #[test]
    fn index_reads_and_writes() {
        let mut array = Array::from_elem(2, 0).unwrap();

        array[1] = 5;

        assert_eq!(array[0], 0);
        assert_eq!(array[1], 5);
    }

    #[test]
    #[should_panic]
    fn index_out_of_range_panics() {
        let array = Array::from_elem(2, 0).unwrap();
        let _value = array[2];
    }

    #[test]
    fn get_unchecked_within_bounds() {
        let mut array = Array::from_elem(2, 3).unwrap();

        // SAFETY: Index 1 is below the length of 2.
        unsafe { *array.get_unchecked_mut(1) = 4 };

        // SAFETY: Index 1 is below the length of 2.
        assert_eq!(unsafe { *array.get_unchecked(1) }, 4);
    }

    #[test]
    fn front_and_back() {
        let mut array = Array::new();

        assert_eq!(array.front(), Err(Error::Empty));
        assert_eq!(array.back(), Err(Error::Empty));
        assert_eq!(array.front_mut(), Err(Error::Empty));
        assert_eq!(array.back_mut(), Err(Error::Empty));

        array.push(1).unwrap();
        array.push(2).unwrap();
        *array.back_mut().unwrap() += 10;
        *array.front_mut().unwrap() += 100;

        assert_eq!(array.front(), Ok(&101));
        assert_eq!(array.back(), Ok(&12));
    }

    #[test]
    fn reserve_is_exact_and_keeps_len() {
        let tracking = Tracking::default();
        let mut array = Array::new_in(&tracking);
        array.push(1).unwrap();

        array.reserve(10).unwrap();

        assert_eq!(array.capacity(), 10);
        assert_eq!(array.len(), 1);
        assert_eq!(tracking.last_allocation_count.get(), 10);

        // Smaller requests are a no-op.
        array.reserve(3).unwrap();
        assert_eq!(array.capacity(), 10);
        assert_eq!(tracking.allocations.get(), 2);
    }

    #[test]
    fn reserve_impossible_capacity_overflows() {
        let mut array = Array::<u64>::new();

        assert_eq!(array.reserve(usize::MAX), Err(Error::CapacityOverflow));
        assert_eq!(array.capacity(), 0);
    }

    #[test]
    fn resize_grows_with_clones_and_shrinks_with_destroy() {
        let tracker = DropTracker::new();
        let tracking = Tracking::default();
        let mut array = Array::new_in(&tracking);

        array.resize(4, tracker.track(9)).unwrap();
        assert_eq!(array.len(), 4);
        assert_eq!(array.capacity(), 4);
        assert!(array.iter().all(|value| *value.value() == 9));
        assert_eq!(tracker.drop_count(), 0);

        array.resize(1, tracker.track(0)).unwrap();
        assert_eq!(array.len(), 1);
        assert_eq!(array.capacity(), 4);
        assert_eq!(tracking.destroys.get(), 3);

        // Three destroyed elements plus the unused fill value.
        assert_eq!(tracker.drop_count(), 4);
    }

    #[test]
    fn resize_default_fills_with_default() {
        let mut array = Array::<String>::new();

        array.resize_default(3).unwrap();
        assert_eq!(array, [String::new(), String::new(), String::new()]);

        array.resize_default(0).unwrap();
        assert!(array.is_empty());
    }

    #[test]
    fn resize_with_calls_closure_per_element() {
        let mut array = Array::new();
        let mut next = 0;

        array
            .resize_with(4, || {
                next += 1;
                next
            })
            .unwrap();

        assert_eq!(array, [1, 2, 3, 4]);
    }

    #[test]
    fn resize_failure_keeps_contents() {
        let limited = Limited::new(1);
        let mut array = Array::from_elem_in(2, 'a', &limited).unwrap();

        assert!(matches!(
            array.resize(5, 'b'),
            Err(Error::AllocationFailed { .. })
        ));
        assert_eq!(array, ['a', 'a']);
    }

    #[test]
    fn truncate_and_clear_keep_capacity() {
        let tracker = DropTracker::new();
        let mut array = Array::new();

        for value in 0..6 {
            array.push(tracker.track(value)).unwrap();
        }

        array.truncate(10);
        assert_eq!(array.len(), 6);

        array.truncate(2);
        assert_eq!(array.len(), 2);
        assert_eq!(tracker.drop_count(), 4);

        array.clear();
        assert!(array.is_empty());
        assert_eq!(array.capacity(), 8);
        assert_eq!(tracker.drop_count(), 6);
    }

    #[test]
    fn shrink_to_fit_matches_len() {
        let mut array = Array::with_capacity(16).unwrap();
        array.push(1).unwrap();
        array.push(2).unwrap();

        array.shrink_to_fit().unwrap();
        assert_eq!(array.capacity(), 2);
        assert_eq!(array, [1, 2]);

        array.clear();
        array.shrink_to_fit().unwrap();
        assert_eq!(array.capacity(), 0);
    }

    #[test]
    fn shrink_to_fit_empty_releases_buffer() {
        let tracking = Tracking::default();
        let mut array = Array::<u8, _>::with_capacity_in(4, &tracking).unwrap();

        array.shrink_to_fit().unwrap();

        assert_eq!(array.capacity(), 0);
        assert_eq!(tracking.allocations.get(), 1);
        assert_eq!(tracking.deallocations.get(), 1);
    }

    #[test]
    fn try_clone_is_deep_and_tight() {
        let mut original = Array::with_capacity(8).unwrap();
        original.push("a".to_string()).unwrap();
        original.push("b".to_string()).unwrap();

        let mut copy = original.try_clone().unwrap();
        copy.at_mut(0).unwrap().push('!');

        assert_eq!(copy.capacity(), 2);
        assert_eq!(copy, ["a!".to_string(), "b".to_string()]);
        assert_eq!(original, ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn try_clone_failure_is_reported() {
        let limited = Limited::new(1);
        let original = Array::from_elem_in(3, 1_u8, &limited).unwrap();

        assert!(matches!(
            original.try_clone(),
            Err(Error::AllocationFailed { .. })
        ));
    }

    #[test]
    fn clone_shares_nothing() {
        let tracker = DropTracker::new();
        let original = Array::from_elem(3, tracker.track(5)).unwrap();

        let copy = original.clone();
        drop(original);

        assert_eq!(tracker.drop_count(), 3);
        assert_eq!(copy.len(), 3);

        drop(copy);
        assert_eq!(tracker.drop_count(), 6);
    }

    #[test]
    fn take_leaves_source_empty() {
        let mut source = Array::from_elem(3, 1).unwrap();

        let destination = std::mem::take(&mut source);

        assert_eq!(destination, [1, 1, 1]);
        assert!(source.is_empty());
        assert_eq!(source.capacity(), 0);

        // The source stays usable.
        source.push(2).unwrap();
        assert_eq!(source, [2]);
    }

    #[test]
    fn drop_destroys_every_element_once() {
        let tracker = DropTracker::new();
        let tracking = Tracking::default();

        {
            let mut array = Array::new_in(&tracking);
            for value in 0..10 {
                array.push(tracker.track(value)).unwrap();
            }
        }

        assert_eq!(tracker.drop_count(), 10);
        assert_eq!(tracking.destroys.get(), 10);
        assert_eq!(tracking.allocations.get(), tracking.deallocations.get());
    }

    #[test]
    fn iteration_is_restartable_and_reversible() {
        let array: Array<i32> = (1..=4).collect();

        let iter = array.iter();
        let first_pass: Vec<_> = iter.clone().copied().collect();
        let second_pass: Vec<_> = iter.copied().collect();
        assert_eq!(first_pass, second_pass);

        let reversed: Vec<_> = array.iter().rev().copied().collect();
        assert_eq!(reversed, [4, 3, 2, 1]);

        let mut total = 0;
        for value in &array {
            total += value;
        }
        assert_eq!(total, 10);
    }

    #[test]
    fn iter_mut_modifies_in_place() {
        let mut array: Array<i32> = (1..=3).collect();

        for value in &mut array {
            *value *= 2;
        }

        assert_eq!(array, [2, 4, 6]);
    }

    #[test]
    fn extend_appends() {
        let mut array: Array<i32> = [1, 2].into_iter().collect();

        array.extend([3, 4, 5]);

        assert_eq!(array, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn single_item_extends_double_capacity() {
        let mut array = Array::new();
        let mut capacities = Vec::new();

        for value in 0..9 {
            array.extend(iter::once(value));
            capacities.push(array.capacity());
        }

        assert_eq!(capacities, [1, 2, 4, 4, 8, 8, 8, 8, 16]);
        assert!(array.iter().copied().eq(0..9));
    }

    #[test]
    fn extend_beyond_doubling_reserves_lower_bound() {
        let mut array = Array::new();
        array.push(0).unwrap();

        array.extend(1..10);

        assert_eq!(array.capacity(), 10);
        assert!(array.iter().copied().eq(0..10));

        // The next append past capacity doubles again.
        array.extend(iter::once(10));
        assert_eq!(array.capacity(), 20);
    }

    #[test]
    fn zero_sized_elements() {
        let mut array = Array::new();

        for _ in 0..100 {
            array.push(()).unwrap();
        }

        assert_eq!(array.len(), 100);
        assert_eq!(array.pop(), Ok(()));
        assert_eq!(array.len(), 99);
    }

    #[test]
    fn equality_across_allocators() {
        let tracking = Tracking::default();
        let mut tracked = Array::new_in(&tracking);
        tracked.push(1).unwrap();

        let global: Array<i32> = [1].into_iter().collect();

        assert_eq!(tracked, global);
        assert_eq!(tracked, *[1].as_slice());
    }

    #[test]
    fn debug_lists_elements() {
        let array: Array<i32> = [1, 2].into_iter().collect();

        assert_eq!(format!("{array:?}"), "[1, 2]");
    }
}
