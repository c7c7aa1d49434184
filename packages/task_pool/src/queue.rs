use std::collections::VecDeque;
use std::fmt;

use parking_lot::{Condvar, Mutex};

use crate::{Error, PoolState, Result};

/// A unit of work accepted by the pool.
pub(crate) type Task = Box<dyn FnOnce() + Send + 'static>;

/// The FIFO of pending tasks together with the pool lifecycle state.
///
/// Both live under the same mutex, so "is shutdown requested?" and "is the queue empty?" are
/// always answered consistently. Workers block on `available` until either changes.
pub(crate) struct TaskQueue {
    inner: Mutex<QueueInner>,

    available: Condvar,
}

struct QueueInner {
    tasks: VecDeque<Task>,

    state: PoolState,
}

impl TaskQueue {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                tasks: VecDeque::new(),
                state: PoolState::Running,
            }),
            available: Condvar::new(),
        }
    }

    /// Appends a task at the tail and wakes one waiting worker.
    ///
    /// Tasks are only accepted while the pool is running. A rejected task is dropped.
    pub(crate) fn push(&self, task: Task) -> Result<()> {
        let mut inner = self.inner.lock();

        if inner.state != PoolState::Running {
            return Err(Error::ShutDown);
        }

        inner.tasks.push_back(task);
        drop(inner);

        self.available.notify_one();
        Ok(())
    }

    /// Takes the task at the head of the queue, blocking while the queue is empty.
    ///
    /// Returns `None` once shutdown has been requested and no tasks remain, which tells the
    /// worker to exit. Tasks queued before shutdown are still handed out.
    #[must_use]
    pub(crate) fn pop_blocking(&self) -> Option<Task> {
        let mut inner = self.inner.lock();

        loop {
            if let Some(task) = inner.tasks.pop_front() {
                return Some(task);
            }

            if inner.state != PoolState::Running {
                return None;
            }

            // Spurious wakeups are handled by going around the loop again.
            self.available.wait(&mut inner);
        }
    }

    /// Moves the pool from running to draining and wakes every worker.
    ///
    /// Returns `true` if this call performed the transition, `false` if shutdown had already
    /// been requested.
    pub(crate) fn request_shutdown(&self) -> bool {
        let mut inner = self.inner.lock();

        if inner.state != PoolState::Running {
            return false;
        }

        inner.state = PoolState::Draining;
        drop(inner);

        self.available.notify_all();
        true
    }

    /// Records that every worker has exited.
    pub(crate) fn mark_stopped(&self) {
        let mut inner = self.inner.lock();

        debug_assert!(inner.tasks.is_empty());
        inner.state = PoolState::Stopped;
    }

    #[must_use]
    pub(crate) fn state(&self) -> PoolState {
        self.inner.lock().state
    }

    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().tasks.len()
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();

        f.debug_struct("TaskQueue")
            .field("queued_tasks", &inner.tasks.len())
            .field("state", &inner.state)
            .finish_non_exhaustive()
    }
}
