//! Runs a batch of tasks on a small pool and shows the shutdown behavior.

use std::num::NonZero;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use task_pool::{Error, ThreadPool};

fn main() -> Result<(), Error> {
    let pool = ThreadPool::builder()
        .worker_count(NonZero::new(3).unwrap())
        .thread_name_prefix("readme")
        .build()?;

    let completed = Arc::new(AtomicUsize::new(0));

    for task_index in 0..9 {
        let completed = Arc::clone(&completed);
        pool.submit(move || {
            println!(
                "task {task_index} on {}",
                thread::current().name().unwrap_or("<unnamed>")
            );
            completed.fetch_add(1, Ordering::Relaxed);
        })?;
    }

    pool.shutdown();
    println!(
        "{} tasks completed, pool is {:?}",
        completed.load(Ordering::Relaxed),
        pool.state()
    );

    match pool.submit(|| println!("this never runs")) {
        Ok(()) => println!("unexpectedly accepted a task after shutdown"),
        Err(e) => println!("late submission rejected: {e}"),
    }

    Ok(())
}
