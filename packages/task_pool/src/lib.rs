#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A fixed-size worker thread pool with a FIFO task queue.
//!
//! [`ThreadPool`] starts a fixed number of worker threads up front. Submitted closures go into
//! one shared queue and every idle worker takes the oldest one. The pool stops accepting work
//! once shutdown is requested, but everything accepted before that still runs before the
//! workers exit.
//!
//! # Quick start
//!
//! ```rust
//! use std::num::NonZero;
//! use std::sync::mpsc;
//!
//! use task_pool::ThreadPool;
//!
//! let pool = ThreadPool::new(NonZero::new(2).unwrap())?;
//! let (tx, rx) = mpsc::channel();
//!
//! for n in 0..4 {
//!     let tx = tx.clone();
//!     pool.submit(move || tx.send(n * n).unwrap())?;
//! }
//!
//! // Dropping the pool waits for every submitted task.
//! drop(pool);
//! drop(tx);
//!
//! let mut squares: Vec<_> = rx.iter().collect();
//! squares.sort_unstable();
//! assert_eq!(squares, [0, 1, 4, 9]);
//! # Ok::<(), task_pool::Error>(())
//! ```
//!
//! # Lifecycle
//!
//! A pool moves through [`PoolState::Running`], [`PoolState::Draining`] and
//! [`PoolState::Stopped`], in that order:
//!
//! * [`ThreadPool::request_shutdown()`] moves it to draining without blocking.
//! * [`ThreadPool::shutdown()`] (also called on drop) moves it to draining and then blocks
//!   until every worker has exited, leaving it stopped.
//!
//! Submitting to a pool that is not running fails with [`Error::ShutDown`].
//!
//! # Logging
//!
//! Worker start and exit and shutdown progress are logged at the `debug` level through
//! `tracing`, every executed task at the `trace` level, and panicking tasks at the `error`
//! level.

mod builder;
mod error;
mod pool;
mod queue;
mod worker;

pub use builder::*;
pub use error::*;
pub use pool::*;
pub(crate) use queue::*;
pub(crate) use worker::*;
