//! Inline-execution baseline: no workers, no queues.

use super::ThreadPool;
use crate::config::Config;
use crate::error::Result;
use crate::task::Task;
use std::sync::atomic::{AtomicBool, Ordering};

/// Runs every task synchronously on the submitting thread.
///
/// Exists as the comparison baseline for the benches: any pool that is
/// slower than this on a given workload is pure overhead for that workload.
pub struct DirectPool {
    worker_count: usize,
    exited: AtomicBool,
}

impl DirectPool {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            worker_count: config.worker_threads(),
            exited: AtomicBool::new(false),
        })
    }
}

impl ThreadPool for DirectPool {
    fn submit(&self, task: Task) {
        assert!(
            !self.exited.load(Ordering::Acquire),
            "submit() called on a pool that has already exited"
        );
        task.run();
    }

    fn wait_until_finished(&self) {}

    fn begin(&self) {
        assert!(
            !self.exited.load(Ordering::Acquire),
            "begin() called on a pool that has already exited"
        );
    }

    fn exit(&self) {
        self.exited.store(true, Ordering::Release);
    }

    fn worker_count(&self) -> usize {
        self.worker_count
    }
}

impl std::fmt::Debug for DirectPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectPool")
            .field("worker_count", &self.worker_count)
            .finish_non_exhaustive()
    }
}
