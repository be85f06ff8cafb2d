//! The per-worker coarse-locked pool: one mutex-guarded FIFO per worker.

use super::{spawn_worker, ThreadPool, WorkerHandle};
use crate::config::Config;
use crate::error::Result;
use crate::lifecycle::PoolLifecycle;
use crate::quiescence::QuiescenceTracker;
use crate::task::Task;
use crate::util::CachePadded;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Default)]
struct Slot {
    queue: Mutex<VecDeque<Task>>,
    available: Condvar,
}

struct Inner {
    slots: Vec<CachePadded<Slot>>,
    lifecycle: PoolLifecycle,
    tracker: QuiescenceTracker,
}

/// N independent FIFOs, each with its own mutex and condvar, padded so
/// neighbouring slots do not share a cache line.
///
/// Submission is round robin: task `k` goes to queue `k mod N`. This
/// spreads load evenly in expectation under uniform arrival without any
/// global lock, but it is static: if task costs are skewed and line up with
/// the modulo pattern, one worker is overloaded while its peers idle. No
/// worker ever touches another worker's queue.
pub struct CoarseLocalPool {
    inner: Arc<Inner>,
    workers: Vec<WorkerHandle>,
}

impl CoarseLocalPool {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let num_threads = config.worker_threads();

        let slots = (0..num_threads)
            .map(|_| CachePadded::new(Slot::default()))
            .collect();

        let inner = Arc::new(Inner {
            slots,
            lifecycle: PoolLifecycle::new(config.mode),
            tracker: QuiescenceTracker::new(),
        });

        let mut workers = Vec::with_capacity(num_threads);
        for id in 0..num_threads {
            let inner = inner.clone();
            let thread = spawn_worker(config, id, move || worker_loop(&inner, id))?;
            workers.push(WorkerHandle {
                thread: Some(thread),
            });
        }

        Ok(Self { inner, workers })
    }
}

fn worker_loop(inner: &Inner, id: usize) {
    inner.lifecycle.wait_for_start();
    let slot = &inner.slots[id];

    loop {
        let task = {
            let mut queue = slot.queue.lock();
            loop {
                if let Some(task) = queue.pop_front() {
                    break task;
                }
                if inner.lifecycle.is_exiting() {
                    return;
                }
                slot.available.wait(&mut queue);
            }
        };

        task.run();
        inner.tracker.record_completion();
    }
}

impl ThreadPool for CoarseLocalPool {
    fn submit(&self, task: Task) {
        assert!(
            !self.inner.lifecycle.is_exiting(),
            "submit() called on a pool that has already exited"
        );
        // the submission ticket doubles as the round-robin index
        let seq = self.inner.tracker.record_submit();
        let slot = &self.inner.slots[seq % self.inner.slots.len()];
        {
            let mut queue = slot.queue.lock();
            queue.push_back(task);
        }
        slot.available.notify_one();
    }

    fn wait_until_finished(&self) {
        self.inner.tracker.wait();
    }

    fn begin(&self) {
        self.inner.lifecycle.begin();
    }

    fn exit(&self) {
        self.inner.lifecycle.exit();
        for slot in &self.inner.slots {
            drop(slot.queue.lock());
            slot.available.notify_all();
        }
    }

    fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl std::fmt::Debug for CoarseLocalPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoarseLocalPool")
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

impl Drop for CoarseLocalPool {
    fn drop(&mut self) {
        self.exit();
        for worker in &mut self.workers {
            worker.join();
        }
    }
}
