//! The per-worker lock-free pool: polling workers over `MpscQueue`s.

use super::{spawn_worker, ThreadPool, WorkerHandle};
use crate::config::Config;
use crate::error::Result;
use crate::lifecycle::PoolLifecycle;
use crate::queue::MpscQueue;
use crate::quiescence::QuiescenceTracker;
use crate::task::Task;
use crate::util::{Backoff, CachePadded};
use parking_lot::Mutex;
use std::sync::Arc;

struct Slot {
    queue: MpscQueue<Task>,
    /// Submissions arrive from any thread; this lock funnels them into the
    /// queue's single-pusher discipline. The owning worker pops without it.
    producer_lock: Mutex<()>,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            queue: MpscQueue::new(),
            producer_lock: Mutex::new(()),
        }
    }
}

struct Inner {
    slots: Vec<CachePadded<Slot>>,
    lifecycle: PoolLifecycle,
    tracker: QuiescenceTracker,
}

/// N lock-free queues, one per worker, round-robin submission as in
/// [`CoarseLocalPool`](super::CoarseLocalPool).
///
/// Idle workers never block: they poll their queue with a spin-then-yield
/// backoff. That trades CPU for latency — newly submitted work is picked up
/// almost immediately, at the cost of burning cycles while the pool is
/// empty.
pub struct SpinLocalPool {
    inner: Arc<Inner>,
    workers: Vec<WorkerHandle>,
}

impl SpinLocalPool {
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
    let mut backoff = Backoff::new();

    loop {
        // this worker is the sole consumer of its queue
        if let Some(task) = slot.queue.pop() {
            backoff.reset();
            task.run();
            inner.tracker.record_completion();
            continue;
        }

        inner.tracker.notify_if_quiescent();

        if inner.lifecycle.is_exiting() && slot.queue.is_empty() {
            return;
        }
        backoff.snooze();
    }
}

impl ThreadPool for SpinLocalPool {
    fn submit(&self, task: Task) {
        assert!(
            !self.inner.lifecycle.is_exiting(),
            "submit() called on a pool that has already exited"
        );
        let seq = self.inner.tracker.record_submit();
        let slot = &self.inner.slots[seq % self.inner.slots.len()];
        let _producer = slot.producer_lock.lock();
        slot.queue.push(task);
        // no wakeup needed: the owning worker is polling
    }

    /// Blocks until quiescent, then shuts the pool down: polling workers
    /// would otherwise burn CPU forever once the work is done.
    fn wait_until_finished(&self) {
        self.inner.tracker.wait();
        self.exit();
    }

    fn begin(&self) {
        self.inner.lifecycle.begin();
    }

    fn exit(&self) {
        self.inner.lifecycle.exit();
    }

    fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl std::fmt::Debug for SpinLocalPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpinLocalPool")
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

impl Drop for SpinLocalPool {
    fn drop(&mut self) {
        self.exit();
        for worker in &mut self.workers {
            worker.join();
        }
    }
}
