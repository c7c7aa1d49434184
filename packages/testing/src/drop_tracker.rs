use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts how many times values handed out by it have been dropped.
///
/// Ownership types are easiest to verify by their destructor behavior: "destroyed exactly
/// once", "not destroyed yet", "destroyed when the last owner goes away". Wrap the value under
/// test with [`track()`][Self::track] and compare [`drop_count()`][Self::drop_count] at the
/// interesting points.
///
/// Clones of the tracker share the same counter, so it can be moved into other threads.
///
/// # Example
///
/// ```rust
/// use testing::DropTracker;
///
/// let tracker = DropTracker::new();
///
/// let a = tracker.track(1);
/// let b = tracker.track(2);
/// assert_eq!(tracker.drop_count(), 0);
///
/// drop(a);
/// assert_eq!(tracker.drop_count(), 1);
///
/// drop(b);
/// assert_eq!(tracker.drop_count(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct DropTracker {
    drops: Arc<AtomicUsize>,
}

impl DropTracker {
    /// Creates a tracker that has not observed any drops.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a value so that dropping it is counted by this tracker.
    #[must_use]
    pub fn track<T>(&self, value: T) -> Tracked<T> {
        Tracked {
            value,
            drops: Arc::clone(&self.drops),
        }
    }

    /// Number of tracked values dropped so far.
    #[must_use]
    pub fn drop_count(&self) -> usize {
        self.drops.load(Ordering::Acquire)
    }
}

/// A value whose destruction is reported to the [`DropTracker`] that created it.
///
/// Cloning a tracked value produces another tracked value reporting to the same tracker.
#[derive(Debug)]
pub struct Tracked<T> {
    value: T,
    drops: Arc<AtomicUsize>,
}

impl<T> Tracked<T> {
    /// Returns a reference to the wrapped value.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T: Clone> Clone for Tracked<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            drops: Arc::clone(&self.drops),
        }
    }
}

impl<T: PartialEq> PartialEq for Tracked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: Eq> Eq for Tracked<T> {}

impl<T> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T> DerefMut for Tracked<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.value
    }
}

impl<T> Drop for Tracked<T> {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::AcqRel);
    }
}
