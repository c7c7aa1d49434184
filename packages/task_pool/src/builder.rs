use std::num::NonZero;
use std::sync::Arc;
use std::thread;

use tracing::{debug, error};

use crate::{Error, Result, TaskQueue, ThreadPool, worker_loop};

const DEFAULT_THREAD_NAME_PREFIX: &str = "task_pool";

/// Builder for configuring a [`ThreadPool`].
///
/// # Example
///
/// ```rust
/// use std::num::NonZero;
///
/// use task_pool::ThreadPool;
///
/// let pool = ThreadPool::builder()
///     .worker_count(NonZero::new(2).unwrap())
///     .thread_name_prefix("background")
///     .build()?;
///
/// assert_eq!(pool.worker_count().get(), 2);
/// # Ok::<(), task_pool::Error>(())
/// ```
#[derive(Debug)]
pub struct ThreadPoolBuilder {
    worker_count: Option<NonZero<usize>>,

    thread_name_prefix: String,
}

impl ThreadPoolBuilder {
    pub(crate) fn new() -> Self {
        Self {
            worker_count: None,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
        }
    }

    /// Sets the number of worker threads.
    ///
    /// Default is the available parallelism reported by the operating system, or 1 if that
    /// cannot be determined.
    #[must_use]
    pub fn worker_count(mut self, count: NonZero<usize>) -> Self {
        self.worker_count = Some(count);
        self
    }

    /// Sets the prefix of the worker thread names. Workers are named `{prefix}-{index}`.
    ///
    /// Default is `task_pool`.
    #[must_use]
    pub fn thread_name_prefix(mut self, prefix: &str) -> Self {
        prefix.clone_into(&mut self.thread_name_prefix);
        self
    }

    /// Builds the pool, starting every worker thread before returning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerSpawn`] if a worker thread cannot be started. Workers that were
    /// already started are shut down and joined before the error is returned.
    pub fn build(self) -> Result<ThreadPool> {
        let worker_count = self.worker_count.unwrap_or_else(default_worker_count);
        let queue = Arc::new(TaskQueue::new());
        let mut workers = Vec::with_capacity(worker_count.get());

        for worker_index in 0..worker_count.get() {
            let worker_queue = Arc::clone(&queue);

            let spawned = thread::Builder::new()
                .name(format!("{}-{worker_index}", self.thread_name_prefix))
                .spawn(move || worker_loop(&worker_queue, worker_index));

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(source) => {
                    error!(
                        worker_index,
                        error = %source,
                        "failed to spawn worker thread"
                    );

                    // Dropping the partially built pool drains and joins the started workers.
                    drop(ThreadPool::from_parts(queue, workers, worker_count));

                    return Err(Error::WorkerSpawn { source });
                }
            }
        }

        debug!(
            worker_count = worker_count.get(),
            thread_name_prefix = self.thread_name_prefix.as_str(),
            "thread pool started"
        );

        Ok(ThreadPool::from_parts(queue, workers, worker_count))
    }
}

#[cfg_attr(test, mutants::skip)] // Depends on the machine the tests run on.
fn default_worker_count() -> NonZero<usize> {
    thread::available_parallelism().unwrap_or(NonZero::<usize>::MIN)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::mpsc;

    use testing::with_watchdog;

    use super::*;

    #[cfg_attr(miri, ignore)]
    #[test]
    fn default_builder_uses_available_parallelism() {
        with_watchdog(|| {
            let pool = ThreadPool::builder().build().unwrap();

            assert_eq!(pool.worker_count(), default_worker_count());
        });
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn workers_are_named_with_prefix() {
        with_watchdog(|| {
            let pool = ThreadPool::builder()
                .worker_count(NonZero::new(1).unwrap())
                .thread_name_prefix("named")
                .build()
                .unwrap();

            let (tx, rx) = mpsc::channel();
            pool.submit(move || {
                let name = thread::current().name().map(str::to_string);
                tx.send(name).unwrap();
            })
            .unwrap();

            assert_eq!(rx.recv().unwrap().as_deref(), Some("named-0"));
        });
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn default_prefix_names_threads() {
        with_watchdog(|| {
            let pool = ThreadPool::builder()
                .worker_count(NonZero::new(2).unwrap())
                .build()
                .unwrap();

            let (tx, rx) = mpsc::channel();
            pool.submit(move || {
                let name = thread::current().name().map(str::to_string);
                tx.send(name).unwrap();
            })
            .unwrap();

            let name = rx.recv().unwrap().unwrap();
            assert!(name.starts_with("task_pool-"), "unexpected name {name}");
        });
    }
}
