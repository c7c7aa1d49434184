use std::any::type_name;
use std::fmt;
use std::ptr::NonNull;

use crate::{ControlBlock, SharedPtr};

/// Non-owning observer of an object owned by one or more [`SharedPtr`]s.
///
/// A `WeakPtr` keeps the control block alive, so it can always answer
/// [`expired()`][Self::expired] and [`use_count()`][Self::use_count], but it never keeps the
/// object itself alive. Use [`lock()`][Self::lock] to obtain an owning pointer while the object
/// still exists.
///
/// # Example
///
/// ```rust
/// use owned_ptr::SharedPtr;
///
/// let owner = SharedPtr::new(42);
/// let observer = owner.downgrade();
///
/// assert!(!observer.expired());
/// assert_eq!(*observer.lock(), 42);
///
/// drop(owner);
///
/// assert!(observer.expired());
/// assert!(observer.lock().is_null());
/// ```
pub struct WeakPtr<T> {
    block: Option<NonNull<ControlBlock<T>>>,
}

impl<T> WeakPtr<T> {
    /// Creates an observer of nothing. It is always expired.
    #[must_use]
    pub const fn new() -> Self {
        Self { block: None }
    }

    /// Wraps a block on which the caller has already acquired a weak reference.
    pub(crate) fn from_block(block: NonNull<ControlBlock<T>>) -> Self {
        Self { block: Some(block) }
    }

    fn block(&self) -> Option<&ControlBlock<T>> {
        // SAFETY: Our weak reference keeps the block (not the object) alive.
        self.block.map(|block| unsafe { block.as_ref() })
    }

    /// Number of [`SharedPtr`] instances currently owning the object.
    #[must_use]
    pub fn use_count(&self) -> usize {
        self.block().map_or(0, ControlBlock::strong_count)
    }

    /// Number of `WeakPtr` instances observing the object, including this one.
    ///
    /// Returns 0 for an observer of nothing. The value is a snapshot, and while another thread
    /// is destroying the object it may briefly be one higher than the number of observers.
    #[must_use]
    pub fn weak_count(&self) -> usize {
        self.block().map_or(0, ControlBlock::weak_count)
    }

    /// Whether the observed object has been destroyed (or there never was one).
    #[must_use]
    pub fn expired(&self) -> bool {
        self.use_count() == 0
    }

    /// Attempts to become an owner of the observed object.
    ///
    /// Returns a new owning [`SharedPtr`] if the object is still alive, otherwise a null
    /// [`SharedPtr`]. An object whose last owner is concurrently being dropped is never
    /// revived: either this call wins the race and the drop becomes a non-final decrement,
    /// or the drop wins and this call returns null.
    #[must_use]
    pub fn lock(&self) -> SharedPtr<T> {
        match (self.block, self.block()) {
            (Some(block), Some(block_ref)) if block_ref.try_increment_strong() => {
                SharedPtr::from_block(block)
            }
            _ => SharedPtr::null(),
        }
    }

    /// Stops observing, leaving this an observer of nothing.
    pub fn reset(&mut self) {
        if let Some(block) = self.block.take() {
            // SAFETY: We owned one weak reference and have just forgotten the block.
            unsafe { ControlBlock::release_weak(block) };
        }
    }
}

impl<T> Clone for WeakPtr<T> {
    fn clone(&self) -> Self {
        if let Some(block) = self.block() {
            block.increment_weak();
        }

        Self { block: self.block }
    }
}

impl<T> Drop for WeakPtr<T> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T> Default for WeakPtr<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<&SharedPtr<T>> for WeakPtr<T> {
    fn from(value: &SharedPtr<T>) -> Self {
        value.downgrade()
    }
}

impl<T> fmt::Debug for WeakPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("use_count", &self.use_count())
            .field("weak_count", &self.weak_count())
            .finish_non_exhaustive()
    }
}

// SAFETY: A `WeakPtr` can be locked into a `SharedPtr` on any thread, so it needs the same
// bounds as `SharedPtr`.
unsafe impl<T: Send + Sync> Send for WeakPtr<T> {}

// SAFETY: Same reasoning as `Send`.
unsafe impl<T: Send + Sync> Sync for WeakPtr<T> {}
