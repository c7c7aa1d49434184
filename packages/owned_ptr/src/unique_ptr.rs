use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

use crate::{Error, Result};

const NULL_DEREFERENCE: Error = Error::NullDereference {
    pointer_kind: "UniquePtr",
};

/// Exclusive owner of at most one heap-allocated `T`.
///
/// At most one `UniquePtr` ever refers to a given object. The owned object is destroyed when
/// the pointer is dropped, [`reset()`][Self::reset] or given a new object to own. Ownership can
/// be handed over with [`take()`][Self::take] (which leaves a null pointer behind) or given up
/// entirely with [`release()`][Self::release].
///
/// The pointer cannot be cloned - that would create a second owner.
///
/// # Dereferencing
///
/// [`get_ref()`][Self::get_ref] and [`get_mut()`][Self::get_mut] report a null pointer as
/// [`Error::NullDereference`]. The [`Deref`] and [`DerefMut`] implementations exist for
/// convenience and panic with the same message when the pointer is null.
///
/// # Example
///
/// ```rust
/// use owned_ptr::UniquePtr;
///
/// let mut first = UniquePtr::new("Alice".to_string());
/// assert_eq!(first.len(), 5);
///
/// // Hand ownership over - the source is left null.
/// let second = first.take();
/// assert!(first.is_null());
/// assert!(first.get_ref().is_err());
/// assert_eq!(*second, "Alice");
/// ```
pub struct UniquePtr<T> {
    ptr: Option<NonNull<T>>,

    _owns: PhantomData<T>,
}

impl<T> UniquePtr<T> {
    /// Creates a pointer that owns nothing.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            ptr: None,
            _owns: PhantomData,
        }
    }

    /// Moves `value` to the heap and takes ownership of it.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::from(Box::new(value))
    }

    /// Takes ownership of the object behind a raw pointer. A null pointer produces a null
    /// `UniquePtr`.
    ///
    /// # Safety
    ///
    /// The pointer must be null or have been produced by [`Box::into_raw()`] (which includes
    /// pointers returned from [`release()`][Self::release]), and nothing else may own it.
    #[must_use]
    pub unsafe fn from_raw(ptr: *mut T) -> Self {
        Self {
            ptr: NonNull::new(ptr),
            _owns: PhantomData,
        }
    }

    /// Whether the pointer currently owns nothing.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.ptr.is_none()
    }

    /// Returns the raw pointer to the owned object without giving up ownership.
    ///
    /// Returns a null pointer if nothing is owned. The pointer is valid for as long as this
    /// `UniquePtr` keeps owning the object.
    #[must_use]
    pub fn as_ptr(&self) -> *mut T {
        self.ptr.map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    /// Borrows the owned object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NullDereference`] if nothing is owned.
    pub fn get_ref(&self) -> Result<&T> {
        let ptr = self.ptr.ok_or(NULL_DEREFERENCE)?;

        // SAFETY: We own the object and it stays alive for as long as we do. Shared access
        // through `&self` cannot conflict with exclusive access, which needs `&mut self`.
        Ok(unsafe { ptr.as_ref() })
    }

    /// Exclusively borrows the owned object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NullDereference`] if nothing is owned.
    pub fn get_mut(&mut self) -> Result<&mut T> {
        let mut ptr = self.ptr.ok_or(NULL_DEREFERENCE)?;

        // SAFETY: We are the only owner and the caller holds `&mut self`, so no other
        // reference to the object can exist.
        Ok(unsafe { ptr.as_mut() })
    }

    /// Gives up ownership without destroying the object, leaving this pointer null.
    ///
    /// The caller becomes responsible for the object, typically by passing the pointer to
    /// [`from_raw()`][Self::from_raw] or [`Box::from_raw()`] later. Returns null if nothing
    /// was owned.
    #[must_use = "the released object leaks unless ownership is taken again"]
    pub fn release(&mut self) -> *mut T {
        self.ptr.take().map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    /// Converts into a [`Box`], or `None` if nothing is owned.
    #[must_use]
    pub fn into_box(mut self) -> Option<Box<T>> {
        let ptr = self.ptr.take()?;

        // SAFETY: Every owned pointer originates from `Box::into_raw()` (guaranteed by the
        // constructors) and we just gave up our ownership of it.
        Some(unsafe { Box::from_raw(ptr.as_ptr()) })
    }

    /// Transfers ownership into a new `UniquePtr`, leaving this one null.
    ///
    /// This is the observable form of a move: the returned pointer owns what this pointer
    /// owned before, and this pointer can still be used (as a null pointer).
    #[must_use]
    pub fn take(&mut self) -> Self {
        Self {
            ptr: self.ptr.take(),
            _owns: PhantomData,
        }
    }

    /// Destroys the owned object, if any, leaving this pointer null.
    pub fn reset(&mut self) {
        if let Some(previous) = self.ptr.take() {
            // SAFETY: We owned the object and just gave up our ownership of it.
            unsafe { destroy(previous) };
        }
    }

    /// Destroys the owned object, if any, and takes ownership of the object behind `ptr`.
    ///
    /// Passing the pointer that is already owned is a no-op. Zero-sized objects all share the
    /// same address, so for a zero-sized `T` the pointers are never treated as equal and the
    /// owned object is always destroyed.
    ///
    /// # Safety
    ///
    /// Same as [`from_raw()`][Self::from_raw]: the pointer must be null or have been produced
    /// by [`Box::into_raw()`] and nothing else may own it.
    pub unsafe fn reset_raw(&mut self, ptr: *mut T) {
        if size_of::<T>() != 0 && self.as_ptr() == ptr {
            return;
        }

        // Adopt first, so a panicking destructor cannot leave us owning a destroyed object.
        let previous = mem::replace(&mut self.ptr, NonNull::new(ptr));

        if let Some(previous) = previous {
            // SAFETY: We owned the object and just gave up our ownership of it.
            unsafe { destroy(previous) };
        }
    }

    /// Destroys the owned object, if any, and takes ownership of `value`.
    pub fn replace(&mut self, value: T) {
        drop(mem::replace(self, Self::new(value)));
    }
}

/// # Safety
///
/// The pointer must come from `Box::into_raw()` and the caller must own it.
unsafe fn destroy<T>(ptr: NonNull<T>) {
    // SAFETY: Forwarding the caller's guarantees.
    drop(unsafe { Box::from_raw(ptr.as_ptr()) });
}

impl<T> Drop for UniquePtr<T> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T> Default for UniquePtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> From<Box<T>> for UniquePtr<T> {
    fn from(value: Box<T>) -> Self {
        Self {
            ptr: NonNull::new(Box::into_raw(value)),
            _owns: PhantomData,
        }
    }
}

impl<T> Deref for UniquePtr<T> {
    type Target = T;

    /// # Panics
    ///
    /// Panics if the pointer is null.
    fn deref(&self) -> &Self::Target {
        self.get_ref().unwrap_or_else(|e| panic!("{e}"))
    }
}

impl<T> DerefMut for UniquePtr<T> {
    /// # Panics
    ///
    /// Panics if the pointer is null.
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.get_mut().unwrap_or_else(|e| panic!("{e}"))
    }
}

impl<T> fmt::Debug for UniquePtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("ptr", &self.as_ptr())
            .finish_non_exhaustive()
    }
}

// SAFETY: We own the `T` exclusively, exactly like `Box<T>`, so we are thread-mobile whenever
// the `T` itself is.
unsafe impl<T: Send> Send for UniquePtr<T> {}

// SAFETY: Shared access to the pointer only grants shared access to the `T`, exactly like
// `Box<T>`, so sharing is fine whenever sharing the `T` is.
unsafe impl<T: Sync> Sync for UniquePtr<T> {}
