use std::process;
use std::ptr::NonNull;
use std::sync::atomic::{self, AtomicUsize, Ordering};

/// Upper bound on either counter. Going past it means handles are being leaked in a loop; we
/// abort instead of risking a wrap-around to zero and a use-after-free.
const MAX_REFCOUNT: usize = usize::MAX >> 1;

/// Shared bookkeeping behind every [`SharedPtr`][crate::SharedPtr] and
/// [`WeakPtr`][crate::WeakPtr] that refer to the same object.
///
/// The block owns the object (a pointer obtained from `Box::into_raw()`) and two counters.
/// Teardown happens in two phases:
///
/// 1. When `strong` reaches zero, the object is destroyed.
/// 2. When `weak` reaches zero, the block itself is freed.
///
/// All strong owners together hold one extra `weak` reference, released in phase 1. This
/// makes the thread that performs phase 1 and the thread dropping the last `WeakPtr` agree on
/// who frees the block without any lock. [`weak_count()`][Self::weak_count] hides the extra
/// reference, so callers only ever see the number of `WeakPtr` handles.
pub(crate) struct ControlBlock<T> {
    value: NonNull<T>,

    strong: AtomicUsize,

    weak: AtomicUsize,
}

impl<T> ControlBlock<T> {
    /// Allocates a block that owns `value`, with one strong owner and no weak observers.
    ///
    /// # Safety
    ///
    /// `value` must come from `Box::into_raw()` and ownership passes to the block.
    #[must_use]
    pub(crate) unsafe fn allocate(value: NonNull<T>) -> NonNull<Self> {
        let block = Box::new(Self {
            value,
            strong: AtomicUsize::new(1),
            // The extra reference held collectively by the strong owners.
            weak: AtomicUsize::new(1),
        });

        NonNull::from(Box::leak(block))
    }

    /// Pointer to the owned object. Only valid to dereference while `strong > 0`.
    #[must_use]
    pub(crate) fn value(&self) -> NonNull<T> {
        self.value
    }

    #[must_use]
    pub(crate) fn strong_count(&self) -> usize {
        self.strong.load(Ordering::Acquire)
    }

    /// Number of weak observers, excluding the reference the strong owners hold collectively.
    ///
    /// The two counters are read separately, so the result is a snapshot. While the last strong
    /// owner is tearing the object down, the strong count is already zero but the owners' weak
    /// reference has not been released yet, and the result is one higher than the number of
    /// observers until the teardown finishes.
    #[must_use]
    pub(crate) fn weak_count(&self) -> usize {
        let weak = self.weak.load(Ordering::Acquire);

        if self.strong.load(Ordering::Acquire) > 0 {
            weak.saturating_sub(1)
        } else {
            weak
        }
    }

    /// Adds a strong owner. The caller must already be a strong owner.
    pub(crate) fn increment_strong(&self) {
        // Relaxed is enough: the caller's own strong reference keeps the object alive and new
        // references can only be created from existing ones.
        let previous = self.strong.fetch_add(1, Ordering::Relaxed);
        abort_on_overflow(previous);
    }

    /// Adds a strong owner only if at least one strong owner still exists.
    ///
    /// The check and the increment are one atomic step, so an object whose last owner is
    /// already being dropped can never be brought back.
    #[must_use]
    pub(crate) fn try_increment_strong(&self) -> bool {
        let mut current = self.strong.load(Ordering::Relaxed);

        loop {
            if current == 0 {
                return false;
            }

            abort_on_overflow(current);

            let next = current
                .checked_add(1)
                .expect("guarded by MAX_REFCOUNT check above");

            // Acquire on success synchronizes with the Release decrements of other owners, so
            // we see every write they made to the object before handing it out.
            match self.strong.compare_exchange_weak(
                current,
                next,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    /// Adds a weak observer. The caller must hold a strong or weak reference.
    pub(crate) fn increment_weak(&self) {
        let previous = self.weak.fetch_add(1, Ordering::Relaxed);
        abort_on_overflow(previous);
    }

    /// Gives up one strong reference, destroying the object if it was the last one and
    /// freeing the block if no weak observers remain.
    ///
    /// # Safety
    ///
    /// The caller must own one strong reference to the block and must not use it afterwards.
    pub(crate) unsafe fn release_strong(this: NonNull<Self>) {
        // SAFETY: The caller's strong reference keeps the block alive until the decrement.
        let block = unsafe { this.as_ref() };

        // Release publishes our writes to the object to whoever performs the teardown.
        if block.strong.fetch_sub(1, Ordering::Release) != 1 {
            return;
        }

        // Synchronizes with the Release decrements of all other owners.
        atomic::fence(Ordering::Acquire);

        // Even if the object's destructor panics, the strong owners' weak reference has to go.
        let _weak_guard = ReleaseWeakOnDrop(this);

        // SAFETY: The strong count reached zero, so we are the only party that may touch the
        // object and `try_increment_strong()` can no longer hand it out. It was created by
        // `Box::into_raw()` as required by `allocate()`.
        drop(unsafe { Box::from_raw(block.value.as_ptr()) });
    }

    /// Gives up one weak reference, freeing the block if it was the last one.
    ///
    /// # Safety
    ///
    /// The caller must own one weak reference to the block and must not use it afterwards.
    pub(crate) unsafe fn release_weak(this: NonNull<Self>) {
        // SAFETY: The caller's weak reference keeps the block alive until the decrement.
        let block = unsafe { this.as_ref() };

        if block.weak.fetch_sub(1, Ordering::Release) != 1 {
            return;
        }

        atomic::fence(Ordering::Acquire);

        // SAFETY: No strong or weak references remain, so nobody else can reach the block.
        // It was allocated via `Box` in `allocate()`.
        drop(unsafe { Box::from_raw(this.as_ptr()) });
    }
}

struct ReleaseWeakOnDrop<T>(NonNull<ControlBlock<T>>);

impl<T> Drop for ReleaseWeakOnDrop<T> {
    fn drop(&mut self) {
        // SAFETY: Only created in `release_strong()` after the last strong reference is gone,
        // taking over the weak reference the strong owners held collectively.
        unsafe {
            ControlBlock::release_weak(self.0);
        }
    }
}

#[cfg_attr(test, mutants::skip)] // Impractical to reach the limit in a test.
fn abort_on_overflow(count: usize) {
    if count > MAX_REFCOUNT {
        process::abort();
    }
}
