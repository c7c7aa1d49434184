use thiserror::Error;

/// Errors reported by the ownership pointers.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The pointer does not own or share any object, so there is nothing to dereference.
    #[error("dereferenced a null {pointer_kind}")]
    NullDereference {
        /// Which pointer type was dereferenced, for diagnostics.
        pointer_kind: &'static str,
    },
}

/// A specialized `Result` type for pointer operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
