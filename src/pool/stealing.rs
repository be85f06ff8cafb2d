//! The work-stealing pool: polling workers that raid peer queues when idle.

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
    producer_lock: Mutex<()>,
    /// Stealing makes every queue multi-consumer: the owner and any thief
    /// may race on the pop side, which the queue itself does not tolerate.
    /// All consumer-side pops go through this lock; it is uncontended
    /// unless a steal is actually in progress.
    consumer_lock: Mutex<()>,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            queue: MpscQueue::new(),
            producer_lock: Mutex::new(()),
            consumer_lock: Mutex::new(()),
        }
    }
}

impl Slot {
    fn take(&self) -> Option<Task> {
        let _consumer = self.consumer_lock.lock();
        self.queue.pop()
    }
}

struct Inner {
    slots: Vec<CachePadded<Slot>>,
    lifecycle: PoolLifecycle,
    tracker: QuiescenceTracker,
}

/// Same queues and round-robin submission as
/// [`SpinLocalPool`](super::SpinLocalPool); the difference is solely the
/// idle path. A worker whose own queue is empty scans its peers in
/// increasing offset order `(id+1) mod N, (id+2) mod N, …` and takes the
/// first task it finds, falling back to backoff only when every queue was
/// empty.
///
/// This bounds imbalance — a worker never idles while any peer holds ready
/// work — at the cost of O(N) probing per idle sweep. There is no fairness
/// guarantee about which idle worker wins a race for the same victim's
/// task.
pub struct StealingPool {
    inner: Arc<Inner>,
    workers: Vec<WorkerHandle>,
}

impl StealingPool {
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
    let count = inner.slots.len();
    let mut backoff = Backoff::new();

    loop {
        // offset 0 is the worker's own queue, then peers in cyclic order
        let mut found = None;
        for offset in 0..count {
            let victim = &inner.slots[(id + offset) % count];
            if let Some(task) = victim.take() {
                found = Some(task);
                break;
            }
        }

        match found {
            Some(task) => {
                backoff.reset();
                task.run();
                inner.tracker.record_completion();
            }
            None => {
                inner.tracker.notify_if_quiescent();
                // the failed sweep just observed every queue empty
                if inner.lifecycle.is_exiting() {
                    return;
                }
                backoff.snooze();
            }
        }
    }
}

impl ThreadPool for StealingPool {
    fn submit(&self, task: Task) {
        assert!(
            !self.inner.lifecycle.is_exiting(),
            "submit() called on a pool that has already exited"
        );
        let seq = self.inner.tracker.record_submit();
        let slot = &self.inner.slots[seq % self.inner.slots.len()];
        let _producer = slot.producer_lock.lock();
        slot.queue.push(task);
    }

    /// Blocks until quiescent, then shuts the pool down, as in
    /// [`SpinLocalPool`](super::SpinLocalPool).
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

impl std::fmt::Debug for StealingPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StealingPool")
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

impl Drop for StealingPool {
    fn drop(&mut self) {
        self.exit();
        for worker in &mut self.workers {
            worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_runs_submitted_tasks() {
        let config = Config::builder().num_threads(4).build().unwrap();
        let pool = StealingPool::new(&config).unwrap();

        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..1000 {
            let counter = counter.clone();
            pool.execute(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        pool.wait_until_finished();
        assert_eq!(counter.load(Ordering::SeqCst), 1000);
    }

    #[test]
    fn test_single_worker_degenerates_to_spin_pool() {
        let config = Config::builder().num_threads(1).build().unwrap();
        let pool = StealingPool::new(&config).unwrap();

        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..50 {
            let order = order.clone();
            pool.execute(move || {
                order.lock().push(i);
            });
        }

        pool.wait_until_finished();
        assert_eq!(*order.lock(), (0..50).collect::<Vec<_>>());
    }
}
