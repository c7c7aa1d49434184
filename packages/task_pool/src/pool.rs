//! Pool management and lifecycle.

use std::any::type_name;
use std::fmt;
use std::num::NonZero;
use std::panic;
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use tracing::debug;

use crate::{Result, TaskQueue, ThreadPoolBuilder};

/// Lifecycle state of a [`ThreadPool`].
///
/// A pool only ever moves forward: `Running` to `Draining` to `Stopped`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum PoolState {
    /// The pool accepts new tasks.
    Running,

    /// Shutdown has been requested. New tasks are rejected but workers keep going until every
    /// previously accepted task has run.
    Draining,

    /// Every worker has exited. Nothing will run on this pool again.
    Stopped,
}

/// A fixed set of worker threads that execute submitted closures in FIFO order.
///
/// All workers are started when the pool is built and live until the pool shuts down. Tasks
/// are taken from a single shared queue, so with more than one worker the tasks start in
/// submission order but may finish in any order.
///
/// # Lifetime
///
/// When the pool is dropped (or [`shutdown()`][Self::shutdown] is called):
/// 1. The pool stops accepting tasks. [`submit()`][Self::submit] returns
///    [`Error::ShutDown`][crate::Error::ShutDown] from then on.
/// 2. Every task accepted before that point still runs.
/// 3. The call blocks until all worker threads have exited.
///
/// Shutting down from inside a task running on the same pool deadlocks, because the worker
/// would wait for itself.
///
/// # Panics in tasks
///
/// A panicking task does not take its worker down. The panic is caught, logged at the
/// `error` level and the worker moves on to the next task.
///
/// # Example
///
/// ```rust
/// use std::num::NonZero;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use task_pool::ThreadPool;
///
/// let pool = ThreadPool::new(NonZero::new(4).unwrap())?;
/// let counter = Arc::new(AtomicUsize::new(0));
///
/// for _ in 0..10 {
///     let counter = Arc::clone(&counter);
///     pool.submit(move || {
///         counter.fetch_add(1, Ordering::Relaxed);
///     })?;
/// }
///
/// pool.shutdown();
/// assert_eq!(counter.load(Ordering::Relaxed), 10);
/// # Ok::<(), task_pool::Error>(())
/// ```
pub struct ThreadPool {
    queue: Arc<TaskQueue>,

    // Emptied by the first shutdown. The lock is held while joining so that concurrent
    // shutdown calls only return once every worker is gone.
    workers: Mutex<Vec<JoinHandle<()>>>,

    worker_count: NonZero<usize>,
}

impl ThreadPool {
    /// Creates a pool with exactly `worker_count` worker threads, all started immediately.
    ///
    /// Use [`ThreadPool::builder()`] for further configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerSpawn`][crate::Error::WorkerSpawn] if a worker thread cannot be
    /// started. Any workers that did start are shut down before the error is returned.
    pub fn new(worker_count: NonZero<usize>) -> Result<Self> {
        Self::builder().worker_count(worker_count).build()
    }

    /// Creates a builder for configuring the pool.
    #[must_use]
    pub fn builder() -> ThreadPoolBuilder {
        ThreadPoolBuilder::new()
    }

    pub(crate) fn from_parts(
        queue: Arc<TaskQueue>,
        workers: Vec<JoinHandle<()>>,
        worker_count: NonZero<usize>,
    ) -> Self {
        Self {
            queue,
            workers: Mutex::new(workers),
            worker_count,
        }
    }

    /// Enqueues `task` at the tail of the queue and wakes one idle worker.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShutDown`][crate::Error::ShutDown] if shutdown has already been
    /// requested. The task is dropped without running.
    pub fn submit<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.push(Box::new(task))
    }

    /// Stops accepting new tasks and lets the workers drain the queue, without waiting for
    /// them.
    ///
    /// Calling this more than once has no further effect.
    pub fn request_shutdown(&self) {
        if self.queue.request_shutdown() {
            debug!(
                queued_tasks = self.queue.len(),
                "thread pool shutdown requested"
            );
        }
    }

    /// Stops accepting new tasks and blocks until every accepted task has run and every
    /// worker thread has exited.
    ///
    /// Calling this more than once is harmless. When it returns, the pool is
    /// [`PoolState::Stopped`].
    pub fn shutdown(&self) {
        self.request_shutdown();

        let mut workers = self.workers.lock();

        if workers.is_empty() {
            return;
        }

        // Every worker is joined even if one of them panicked, so no thread outlives the pool.
        let first_panic = workers
            .drain(..)
            .filter_map(|handle| handle.join().err())
            .reduce(|first, _| first);

        self.queue.mark_stopped();

        debug!(
            worker_count = self.worker_count.get(),
            "thread pool stopped"
        );

        if let Some(payload) = first_panic {
            // Workers contain task panics, so a panicking worker means the pool itself is
            // broken. Propagate rather than hide it.
            panic::resume_unwind(payload);
        }
    }

    /// The current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PoolState {
        self.queue.state()
    }

    /// Number of worker threads the pool was built with.
    #[must_use]
    pub fn worker_count(&self) -> NonZero<usize> {
        self.worker_count
    }

    /// Number of tasks waiting in the queue. Tasks that a worker has already started are not
    /// included.
    #[must_use]
    pub fn queued_tasks(&self) -> usize {
        self.queue.len()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("worker_count", &self.worker_count)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}
