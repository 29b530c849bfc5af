//! Bounded worker pools for the pull and save stages.
//!
//! A [`WorkerPool`] runs one homogeneous kind of task over an ordered source
//! of work items with at most `threads()` tasks in flight. Items are taken
//! from the source in order, one at a time, as workers become free; the
//! caller is blocked until every dispatched task has finished.

use crate::error::{HarbexError, Result};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};


/// Worker count setting, resolved from the configured `runtime.pool` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolSize {
    /// One task at a time.
    Serial,
    /// A fixed number of workers.
    Fixed(usize),
    /// As many workers as the platform reports available parallelism.
    PlatformDefault,
}

impl PoolSize {
    /// Resolves a configured pool value: negative means the platform default,
    /// zero means serial.
    ///
    /// # Examples
    ///
    /// ```
    /// use libharbex::pool::PoolSize;
    ///
    /// assert_eq!(PoolSize::from_setting(0), PoolSize::Serial);
    /// assert_eq!(PoolSize::from_setting(4), PoolSize::Fixed(4));
    /// assert_eq!(PoolSize::from_setting(-1), PoolSize::PlatformDefault);
    /// ```
    pub fn from_setting(value: i64) -> Self {
        match value {
            v if v < 0 => Self::PlatformDefault,
            0 | 1 => Self::Serial,
            v => Self::Fixed(v as usize),
        }
    }

    /// Number of worker threads this setting stands for. Always at least 1.
    pub fn threads(&self) -> usize {
        match self {
            Self::Serial => 1,
            Self::Fixed(n) => (*n).max(1),
            Self::PlatformDefault => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

/// Outcome of a stage that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    /// Number of tasks that completed successfully.
    pub completed: usize,
}

/// Fixed-size thread pool with a completion barrier.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    threads: usize,
}

impl WorkerPool {
    /// Creates a pool with the resolved number of worker threads.
    pub fn new(size: PoolSize) -> Result<Self> {
        let threads = size.threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("harbex-worker-{}", i))
            .build()
            .map_err(|e| HarbexError::validation_with_source("Failed to create thread pool", e))?;

        Ok(Self { pool, threads })
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Runs `task` once per item of `items`, with at most [`threads`](Self::threads)
    /// tasks running at the same time, and waits for all of them.
    ///
    /// Items are dispatched in iteration order. After the first failed task no
    /// further items are dispatched; tasks already running are allowed to
    /// finish, then the first error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use libharbex::pool::{PoolSize, WorkerPool};
    ///
    /// let pool = WorkerPool::new(PoolSize::Fixed(2)).unwrap();
    /// let report = pool.run(vec![1, 2, 3], |_n: i32| Ok(())).unwrap();
    /// assert_eq!(report.completed, 3);
    /// ```
    pub fn run<I, F>(&self, items: I, task: F) -> Result<StageReport>
    where
        I: IntoIterator,
        I::IntoIter: Send,
        I::Item: Send,
        F: Fn(I::Item) -> Result<()> + Sync + Send,
    {
        let completed = AtomicUsize::new(0);
        let items = items.into_iter();

        self.pool.install(|| {
            items.par_bridge().try_for_each(|item| {
                task(item)?;
                completed.fetch_add(1, Ordering::Relaxed);
                Ok::<(), HarbexError>(())
            })
        })?;

        Ok(StageReport {
            completed: completed.into_inner(),
        })
    }
}
