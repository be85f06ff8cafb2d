//! The shared-queue pool: one global FIFO, N contending workers.

use super::{spawn_worker, ThreadPool, WorkerHandle};
use crate::config::Config;
use crate::error::Result;
use crate::lifecycle::PoolLifecycle;
use crate::quiescence::QuiescenceTracker;
use crate::task::Task;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;

struct Inner {
    queue: Mutex<VecDeque<Task>>,
    available: Condvar,
    lifecycle: PoolLifecycle,
    tracker: QuiescenceTracker,
}

/// One FIFO queue guarded by one mutex; every worker blocks on the same
/// condvar until the queue is non-empty or the pool is exiting.
///
/// The simplest of the four designs and the throughput baseline: the single
/// shared queue is exactly the contention point the per-worker pools exist
/// to remove.
pub struct SharedQueuePool {
    inner: Arc<Inner>,
    workers: Vec<WorkerHandle>,
}

impl SharedQueuePool {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let num_threads = config.worker_threads();

        let inner = Arc::new(Inner {
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            lifecycle: PoolLifecycle::new(config.mode),
            tracker: QuiescenceTracker::new(),
        });

        let mut workers = Vec::with_capacity(num_threads);
        for id in 0..num_threads {
            let inner = inner.clone();
            let thread = spawn_worker(config, id, move || worker_loop(&inner))?;
            workers.push(WorkerHandle {
                thread: Some(thread),
            });
        }

        Ok(Self { inner, workers })
    }
}

fn worker_loop(inner: &Inner) {
    inner.lifecycle.wait_for_start();

    loop {
        let task = {
            let mut queue = inner.queue.lock();
            loop {
                if let Some(task) = queue.pop_front() {
                    break task;
                }
                // only terminate once the queue is drained
                if inner.lifecycle.is_exiting() {
                    return;
                }
                inner.available.wait(&mut queue);
            }
        };

        // run outside the lock
        task.run();
        inner.tracker.record_completion();
    }
}

impl ThreadPool for SharedQueuePool {
    fn submit(&self, task: Task) {
        assert!(
            !self.inner.lifecycle.is_exiting(),
            "submit() called on a pool that has already exited"
        );
        // count before enqueue so a waiter never sees the counters match
        // while this task is in flight
        self.inner.tracker.record_submit();
        {
            let mut queue = self.inner.queue.lock();
            queue.push_back(task);
        }
        self.inner.available.notify_one();
    }

    fn wait_until_finished(&self) {
        self.inner.tracker.wait();
    }

    fn begin(&self) {
        self.inner.lifecycle.begin();
    }

    fn exit(&self) {
        self.inner.lifecycle.exit();
        // take the queue lock so a worker between its predicate check and
        // its wait cannot miss the wakeup
        drop(self.inner.queue.lock());
        self.inner.available.notify_all();
    }

    fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl std::fmt::Debug for SharedQueuePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedQueuePool")
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

impl Drop for SharedQueuePool {
    fn drop(&mut self) {
        self.exit();
        for worker in &mut self.workers {
            worker.join();
        }
    }
}
