use std::io;

use thiserror::Error;

/// Errors reported by [`ThreadPool`][crate::ThreadPool].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A task was submitted after shutdown of the pool had been requested. The task was
    /// dropped without running.
    #[error("the thread pool is shutting down and no longer accepts tasks")]
    ShutDown,

    /// The operating system refused to start a worker thread while the pool was being built.
    #[error("failed to spawn a worker thread")]
    WorkerSpawn {
        /// The error reported by the operating system.
        #[source]
        source: io::Error,
    },
}

/// A specialized `Result` type for thread pool operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
