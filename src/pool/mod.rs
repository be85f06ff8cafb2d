//! The common pool abstraction and its four engines.
//!
//! Each engine fixes its worker count at construction, spawns the workers
//! immediately, and joins them on drop. They differ only in queue topology,
//! locking granularity, and load-balancing strategy:
//!
//! - [`SharedQueuePool`] — one global FIFO, all workers contend for it.
//! - [`CoarseLocalPool`] — one mutex-guarded FIFO per worker, round-robin
//!   submission, no cross-queue access.
//! - [`SpinLocalPool`] — one lock-free queue per worker; idle workers poll
//!   instead of blocking.
//! - [`StealingPool`] — same as [`SpinLocalPool`], but an idle worker scans
//!   peer queues before backing off.
//!
//! [`DirectPool`] runs tasks inline on the submitting thread and serves as
//! the benchmark baseline.

pub mod coarse;
pub mod direct;
pub mod shared;
pub mod spin;
pub mod stealing;

pub use coarse::CoarseLocalPool;
pub use direct::DirectPool;
pub use shared::SharedQueuePool;
pub use spin::SpinLocalPool;
pub use stealing::StealingPool;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::task::Task;
use std::thread::{self, JoinHandle};

/// The contract shared by every pool in this crate.
///
/// Submission is synchronous (the task is enqueued before `submit`
/// returns), execution is asynchronous, and there is no guarantee about
/// which worker runs which task. Tasks routed to the same queue run in
/// submission order.
pub trait ThreadPool: Send + Sync {
    /// Enqueue a task for execution.
    ///
    /// # Panics
    ///
    /// Panics if the pool has already been told to exit; submitting to a
    /// shut-down pool is a programming error, not a recoverable condition.
    fn submit(&self, task: Task);

    /// Block until every task submitted so far, including tasks submitted
    /// by other tasks, has completed. Safe to call repeatedly.
    ///
    /// The polling pools ([`SpinLocalPool`], [`StealingPool`]) additionally
    /// trigger [`exit`](ThreadPool::exit) once the pool is quiescent.
    fn wait_until_finished(&self);

    /// Release a [`Mode::Batch`](crate::Mode::Batch) pool to start
    /// executing. No-op when already running; panics after `exit`.
    fn begin(&self);

    /// Signal shutdown. Idempotent. Workers finish draining their queues
    /// and terminate; dropping the pool joins them.
    fn exit(&self);

    /// Number of worker threads, fixed at construction.
    fn worker_count(&self) -> usize;

    /// Convenience wrapper: submit a closure as a [`Task`].
    fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
        Self: Sized,
    {
        self.submit(Task::new(f));
    }
}

/// A spawned worker thread, joined when the pool shuts down.
pub(crate) struct WorkerHandle {
    pub(crate) thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub(crate) fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

pub(crate) fn spawn_worker<F>(config: &Config, id: usize, f: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    let name = format!("{}-{}", config.thread_name_prefix, id);
    let mut builder = thread::Builder::new().name(name);

    if let Some(stack_size) = config.stack_size {
        builder = builder.stack_size(stack_size);
    }

    builder
        .spawn(f)
        .map_err(|e| Error::executor(format!("spawn failed: {}", e)))
}
