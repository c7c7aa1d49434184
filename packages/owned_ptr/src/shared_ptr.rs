use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::Deref;
use std::ptr::{self, NonNull};

use crate::{ControlBlock, Error, Result, WeakPtr};

const NULL_DEREFERENCE: Error = Error::NullDereference {
    pointer_kind: "SharedPtr",
};

/// Shared owner of a heap-allocated `T`, with thread-safe reference counting.
///
/// Every clone adds one strong reference. The object is destroyed exactly once, when the last
/// strong reference goes away. Non-owning observers are created with
/// [`downgrade()`][Self::downgrade] and can later attempt to regain ownership through
/// [`WeakPtr::lock()`].
///
/// The reference counts are atomic, so clones may be created and dropped on any thread. The
/// object itself gets no synchronization - like with [`std::sync::Arc`], only shared access is
/// granted and interior mutability is up to the `T`.
///
/// # Dereferencing
///
/// [`get_ref()`][Self::get_ref] reports a null pointer as [`Error::NullDereference`]. The
/// [`Deref`] implementation panics with the same message when the pointer is null.
///
/// # Example
///
/// ```rust
/// use owned_ptr::SharedPtr;
///
/// let first = SharedPtr::new("Bob".to_string());
/// let second = first.clone();
///
/// assert_eq!(first.use_count(), 2);
/// assert!(first.ptr_eq(&second));
///
/// drop(first);
/// assert_eq!(second.use_count(), 1);
/// assert_eq!(*second, "Bob");
/// ```
pub struct SharedPtr<T> {
    block: Option<NonNull<ControlBlock<T>>>,

    _owns: PhantomData<T>,
}

impl<T> SharedPtr<T> {
    /// Creates a pointer that shares nothing. No control block is allocated.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            block: None,
            _owns: PhantomData,
        }
    }

    /// Moves `value` to the heap and becomes its first owner.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::from(Box::new(value))
    }

    /// Becomes the first owner of the object behind a raw pointer, allocating its control
    /// block. A null pointer produces a null `SharedPtr` without a control block.
    ///
    /// # Safety
    ///
    /// The pointer must be null or have been produced by [`Box::into_raw()`], and nothing else
    /// may own it. In particular, do not pass a pointer obtained from another `SharedPtr`:
    /// that would create a second control block and destroy the object twice.
    #[must_use]
    pub unsafe fn from_raw(ptr: *mut T) -> Self {
        let Some(value) = NonNull::new(ptr) else {
            return Self::null();
        };

        // SAFETY: Forwarding the caller's guarantee that the pointer came from `Box::into_raw()`
        // and is ours to own.
        let block = unsafe { ControlBlock::allocate(value) };

        Self::from_block(block)
    }

    /// Wraps a block on which the caller has already acquired a strong reference.
    pub(crate) fn from_block(block: NonNull<ControlBlock<T>>) -> Self {
        Self {
            block: Some(block),
            _owns: PhantomData,
        }
    }

    fn block(&self) -> Option<&ControlBlock<T>> {
        // SAFETY: Our strong reference keeps the block alive for as long as we exist.
        self.block.map(|block| unsafe { block.as_ref() })
    }

    /// Whether the pointer currently shares nothing.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.block.is_none()
    }

    /// Number of `SharedPtr` instances sharing the object, or 0 for a null pointer.
    ///
    /// Other threads may change the count at any moment, so the value is only a snapshot.
    #[must_use]
    pub fn use_count(&self) -> usize {
        self.block().map_or(0, ControlBlock::strong_count)
    }

    /// Number of [`WeakPtr`] instances observing the object, or 0 for a null pointer.
    #[must_use]
    pub fn weak_count(&self) -> usize {
        self.block().map_or(0, ControlBlock::weak_count)
    }

    /// Returns the raw pointer to the shared object without affecting ownership.
    ///
    /// Returns a null pointer if nothing is shared.
    #[must_use]
    pub fn as_ptr(&self) -> *mut T {
        self.block()
            .map_or(ptr::null_mut(), |block| block.value().as_ptr())
    }

    /// Borrows the shared object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NullDereference`] if nothing is shared.
    pub fn get_ref(&self) -> Result<&T> {
        let block = self.block().ok_or(NULL_DEREFERENCE)?;

        // SAFETY: Our strong reference keeps the object alive. Only shared references to the
        // object are ever handed out.
        Ok(unsafe { block.value().as_ref() })
    }

    /// Whether both pointers share the same object. Two null pointers are considered equal.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.block == other.block
    }

    /// Creates a non-owning observer of the shared object.
    ///
    /// Downgrading a null pointer produces a [`WeakPtr`] that can never be upgraded.
    #[must_use]
    pub fn downgrade(&self) -> WeakPtr<T> {
        match self.block {
            Some(block) => {
                // SAFETY: Our strong reference keeps the block alive.
                unsafe { block.as_ref() }.increment_weak();
                WeakPtr::from_block(block)
            }
            None => WeakPtr::new(),
        }
    }

    /// Transfers this pointer's share into a new `SharedPtr`, leaving this one null.
    ///
    /// The use count does not change.
    #[must_use]
    pub fn take(&mut self) -> Self {
        Self {
            block: self.block.take(),
            _owns: PhantomData,
        }
    }

    /// Gives up this pointer's share, leaving it null. Destroys the object if this was the
    /// last owner.
    pub fn reset(&mut self) {
        if let Some(block) = self.block.take() {
            // SAFETY: We owned one strong reference and have just forgotten the block.
            unsafe { ControlBlock::release_strong(block) };
        }
    }

    /// Gives up this pointer's share and becomes the first owner of the object behind `ptr`.
    ///
    /// Passing the pointer to the object already shared is a no-op. Zero-sized objects all
    /// share the same address, so for a zero-sized `T` the pointers are never treated as equal.
    ///
    /// # Safety
    ///
    /// Same as [`from_raw()`][Self::from_raw].
    pub unsafe fn reset_raw(&mut self, ptr: *mut T) {
        if size_of::<T>() != 0 && self.as_ptr() == ptr {
            return;
        }

        // SAFETY: Forwarding the caller's guarantees.
        let replacement = unsafe { Self::from_raw(ptr) };

        drop(mem::replace(self, replacement));
    }

    /// Gives up this pointer's share and becomes the first owner of `value`.
    pub fn replace(&mut self, value: T) {
        drop(mem::replace(self, Self::new(value)));
    }
}

impl<T> Clone for SharedPtr<T> {
    fn clone(&self) -> Self {
        if let Some(block) = self.block() {
            block.increment_strong();
        }

        Self {
            block: self.block,
            _owns: PhantomData,
        }
    }
}

impl<T> Drop for SharedPtr<T> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T> Default for SharedPtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> From<Box<T>> for SharedPtr<T> {
    fn from(value: Box<T>) -> Self {
        // SAFETY: The pointer comes straight from `Box::into_raw()` and has no other owner.
        unsafe { Self::from_raw(Box::into_raw(value)) }
    }
}

impl<T> From<T> for SharedPtr<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T> Deref for SharedPtr<T> {
    type Target = T;

    /// # Panics
    ///
    /// Panics if the pointer is null.
    fn deref(&self) -> &Self::Target {
        self.get_ref().unwrap_or_else(|e| panic!("{e}"))
    }
}

impl<T> fmt::Debug for SharedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("ptr", &self.as_ptr())
            .field("use_count", &self.use_count())
            .field("weak_count", &self.weak_count())
            .finish_non_exhaustive()
    }
}

// SAFETY: Clones on different threads share the `T`, and the last one to go drops it on
// whatever thread that happens to be. That requires the `T` to be both `Send` and `Sync`,
// same as `Arc<T>`. The counters themselves are atomic.
unsafe impl<T: Send + Sync> Send for SharedPtr<T> {}

// SAFETY: Same reasoning as `Send` - a `&SharedPtr<T>` can be cloned into an owning handle.
unsafe impl<T: Send + Sync> Sync for SharedPtr<T> {}
