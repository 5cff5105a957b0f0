//! Bounded worker pool for per-cue jobs.

use std::thread;

use parking_lot::Mutex;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

/// Fixed-size pool. Results come back in input order and the call only
/// returns once every item has been handled.
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    /// Pool with `workers` threads, or one per available core when `0`.
    pub fn new(workers: usize) -> Result<Self, ThreadPoolBuildError> {
        let threads = resolve_workers(workers);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("dubsync-worker-{}", i))
            .build()?;
        tracing::debug!("Worker pool started with {} threads", threads);
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Apply `job` to every item in parallel.
    ///
    /// `on_done(done, total)` is called after each item finishes, from the
    /// worker thread that finished it. Calls are serialized and `done`
    /// strictly increases across them.
    pub fn map<T, R, F, P>(&self, items: Vec<T>, job: F, on_done: P) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Send + Sync,
        P: Fn(usize, usize) + Send + Sync,
    {
        let total = items.len();
        let done = Mutex::new(0usize);

        self.pool.install(|| {
            items
                .into_par_iter()
                .map(|item| {
                    let result = job(item);
                    let mut finished = done.lock();
                    *finished += 1;
                    on_done(*finished, total);
                    drop(finished);
                    result
                })
                .collect()
        })
    }
}

/// `0` means one worker per available core.
pub fn resolve_workers(workers: usize) -> usize {
    if workers > 0 {
        workers
    } else {
        thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}
