#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for testing and benchmarks in the workspace packages.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

mod drop_tracker;

pub use drop_tracker::*;

/// Runs a test with a timeout to prevent infinite hangs.
///
/// Worker pool tests are the main consumer: a lost wakeup or a worker that never observes
/// shutdown turns into a hang rather than a failure, so the test body runs on a separate
/// thread and the calling thread gives up after the timeout.
///
/// The timeout is 10 seconds under normal conditions and 60 seconds under
/// Miri, where thread synchronization primitives are significantly slower.
///
/// When the `MUTATION_TESTING` environment variable is set to "1", the watchdog
/// is disabled and the test function is executed directly. This allows mutation
/// testing to properly detect hanging mutations.
///
/// # Panics
///
/// Panics if the test exceeds the timeout (when not in mutation testing mode).
/// A panic inside the test body is propagated to the caller.
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// with_watchdog(|| {
///     assert_eq!(2 + 2, 4);
/// });
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if std::env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return test_fn();
    }

    let (tx, rx) = mpsc::channel();

    let test_handle = thread::spawn(move || {
        let result = test_fn();
        // If this fails, the receiver has already timed out and nobody is listening.
        drop(tx.send(result));
    });

    let timeout = if cfg!(miri) {
        Duration::from_secs(60)
    } else {
        Duration::from_secs(10)
    };

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            test_handle.join().expect("test thread must not panic after sending its result");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("test exceeded {}-second timeout", timeout.as_secs());
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => match test_handle.join() {
            Ok(()) => panic!("test thread disconnected unexpectedly"),
            Err(e) => std::panic::resume_unwind(e),
        },
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn watchdog_returns_correct_value() {
        let result = with_watchdog(|| "hello world");
        assert_eq!(result, "hello world");
    }

    #[test]
    #[should_panic]
    fn watchdog_propagates_panic() {
        with_watchdog(|| panic!("intentional panic"));
    }
}
