//! quadpool - a comparative study of thread-pool designs
//!
//! One pool abstraction, four concurrency engines that differ in queue
//! topology, locking granularity, and load-balancing strategy:
//!
//! | Pool | Queues | Idle policy | Balancing |
//! |------|--------|-------------|-----------|
//! | [`SharedQueuePool`] | 1 shared, mutex + condvar | block | implicit (shared queue) |
//! | [`CoarseLocalPool`] | N, mutex + condvar each | block | round robin |
//! | [`SpinLocalPool`] | N, lock-free | spin/yield | round robin |
//! | [`StealingPool`] | N, lock-free | steal, then spin/yield | round robin + stealing |
//!
//! # Quick Start
//!
//! ```
//! use quadpool::{Config, SharedQueuePool, ThreadPool};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let config = Config::builder().num_threads(4).build().unwrap();
//! let pool = SharedQueuePool::new(&config).unwrap();
//!
//! let counter = Arc::new(AtomicUsize::new(0));
//! for _ in 0..100 {
//!     let counter = counter.clone();
//!     pool.execute(move || {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!     });
//! }
//!
//! pool.wait_until_finished();
//! assert_eq!(counter.load(Ordering::SeqCst), 100);
//! pool.exit();
//! ```
//!
//! Tasks may submit further tasks to the same pool (recursive sort is the
//! canonical workload); `wait_until_finished` accounts for dynamically
//! growing task graphs and returns only once everything, including
//! descendants, has completed.

#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod pool;
pub mod queue;
mod quiescence;
pub mod task;
pub mod util;

pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use lifecycle::{Mode, Status};
pub use pool::{
    CoarseLocalPool, DirectPool, SharedQueuePool, SpinLocalPool, StealingPool, ThreadPool,
};
pub use queue::MpscQueue;
pub use task::{Task, TaskId};
