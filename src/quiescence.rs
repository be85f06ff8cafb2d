//! Quiescence detection: matching submit and completion counters.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Atomic submit/finish counters plus the condvar behind
/// `wait_until_finished` on every pool.
///
/// Both counters are monotone for the lifetime of the pool; they are never
/// reset, so a drained pool can accept a next batch of work without any
/// reset racing a concurrent submit. Equality of the two counters is the
/// quiescence signal. Because tasks may submit further tasks, `submitted`
/// can keep growing while a waiter is blocked; the wait predicate is
/// re-evaluated on every wakeup.
#[derive(Debug)]
pub(crate) struct QuiescenceTracker {
    submitted: AtomicUsize,
    completed: AtomicUsize,
    waiter_lock: Mutex<()>,
    quiescent: Condvar,
}

impl QuiescenceTracker {
    pub(crate) fn new() -> Self {
        Self {
            submitted: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            waiter_lock: Mutex::new(()),
            quiescent: Condvar::new(),
        }
    }

    /// Counts one submission and returns its sequence number, which the
    /// per-worker pools reuse as the round-robin ticket.
    pub(crate) fn record_submit(&self) -> usize {
        self.submitted.fetch_add(1, Ordering::AcqRel)
    }

    /// Counts one completed task. When the post-increment value catches up
    /// with `submitted`, wakes every `wait()` caller. The waiter lock is
    /// taken before notifying so a waiter cannot check the predicate, miss
    /// the final completion, and then block past the only wakeup.
    pub(crate) fn record_completion(&self) {
        let done = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        if done == self.submitted.load(Ordering::Acquire) {
            drop(self.waiter_lock.lock());
            self.quiescent.notify_all();
        }
    }

    pub(crate) fn is_quiescent(&self) -> bool {
        // completed first: it can only lag submitted, so a stale read here
        // keeps the waiter waiting rather than releasing it early.
        let done = self.completed.load(Ordering::Acquire);
        done == self.submitted.load(Ordering::Acquire)
    }

    /// Used by spinning workers on their idle path as a wake hint.
    pub(crate) fn notify_if_quiescent(&self) {
        if self.is_quiescent() {
            drop(self.waiter_lock.lock());
            self.quiescent.notify_all();
        }
    }

    /// Blocks until every task submitted so far has completed. Returns
    /// immediately when the counters already match (including the trivial
    /// case where nothing was ever submitted).
    pub(crate) fn wait(&self) {
        let mut guard = self.waiter_lock.lock();
        while !self.is_quiescent() {
            self.quiescent.wait(&mut guard);
        }
    }

    #[cfg(test)]
    pub(crate) fn submitted(&self) -> usize {
        self.submitted.load(Ordering::Acquire)
    }

    #[cfg(test)]
    pub(crate) fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }
}
