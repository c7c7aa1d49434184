//! Worker thread logic for executing tasks from the queue.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, trace};

use crate::{Task, TaskQueue};

/// Runs tasks from `queue` until shutdown has been requested and the queue is empty.
pub(crate) fn worker_loop(queue: &TaskQueue, worker_index: usize) {
    debug!(worker_index, "worker thread started");

    while let Some(task) = queue.pop_blocking() {
        run_task(task, worker_index);
    }

    debug!(worker_index, "worker thread exiting");
}

/// Runs one task outside of any lock. A panic inside the task is logged and swallowed so the
/// worker can continue with the next task.
///
/// Returns whether the task completed without panicking.
pub(crate) fn run_task(task: Task, worker_index: usize) -> bool {
    // The task is consumed by the call, so nothing observes its state after a panic.
    match panic::catch_unwind(AssertUnwindSafe(task)) {
        Ok(()) => {
            trace!(worker_index, "executed task");
            true
        }
        Err(payload) => {
            error!(
                worker_index,
                message = panic_message(payload.as_ref()),
                "task panicked"
            );
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}
