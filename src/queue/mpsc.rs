//! Unbounded lock-free queue for the per-worker fine-grained pools.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicPtr, Ordering};

struct Node<T> {
    value: UnsafeCell<Option<T>>,
    next: AtomicPtr<Node<T>>,
}

impl<T> Node<T> {
    fn empty() -> *mut Self {
        Box::into_raw(Box::new(Node {
            value: UnsafeCell::new(None),
            next: AtomicPtr::new(std::ptr::null_mut()),
        }))
    }
}

/// An unbounded singly-linked FIFO queue supporting one concurrent
/// producer-side `push` and one concurrent consumer-side `pop` without
/// blocking.
///
/// A dummy sentinel node is always present. A pushed value is stored in the
/// node that is the tail *at the time of the push*, after which a fresh
/// empty node is linked in and becomes the new tail. That ordering keeps
/// `push` on the tail node and `pop` on the head node, so the two sides
/// never touch the same memory while the queue is non-empty and need no
/// shared lock.
///
/// # Discipline
///
/// At most one thread may call `push` at a time, and at most one thread may
/// call `pop` (or `is_empty`) at a time. The pools uphold this with a tiny
/// per-queue lock on whichever side is shared: the submit path serializes
/// producers, and the stealing pool serializes consumers. Violating the
/// discipline is a logic error that can lose or double-deliver values.
pub struct MpscQueue<T> {
    /// Consumer-owned; only ever read or written by the popping side.
    head: UnsafeCell<*mut Node<T>>,
    tail: AtomicPtr<Node<T>>,
}

// The queue moves `T` across threads, and the single-pusher/single-popper
// discipline (enforced by the pools with per-slot locks) makes the interior
// raw-pointer manipulation race free.
unsafe impl<T: Send> Send for MpscQueue<T> {}
unsafe impl<T: Send> Sync for MpscQueue<T> {}

impl<T> MpscQueue<T> {
    pub fn new() -> Self {
        let sentinel = Node::empty();
        Self {
            head: UnsafeCell::new(sentinel),
            tail: AtomicPtr::new(sentinel),
        }
    }

    /// Appends a value. Never blocks.
    pub fn push(&self, value: T) {
        let new_tail = Node::empty();
        let tail = self.tail.load(Ordering::Relaxed);
        unsafe {
            // The value lands in the current tail node; the consumer will
            // not look at this node's contents until tail has moved past it.
            *(*tail).value.get() = Some(value);
            (*tail).next.store(new_tail, Ordering::Release);
        }
        self.tail.store(new_tail, Ordering::Release);
    }

    /// Takes the oldest value, or `None` when the queue is empty. Never
    /// blocks; callers supply their own wait or backoff policy.
    pub fn pop(&self) -> Option<T> {
        unsafe {
            let head = *self.head.get();
            if head == self.tail.load(Ordering::Acquire) {
                return None;
            }
            // tail has moved past head, so the push that advanced it has
            // already published both the value and the next link.
            let next = (*head).next.load(Ordering::Acquire);
            debug_assert!(!next.is_null());
            let value = (*(*head).value.get()).take();
            *self.head.get() = next;
            drop(Box::from_raw(head));
            value
        }
    }

    /// Consumer-side emptiness check.
    pub fn is_empty(&self) -> bool {
        unsafe { *self.head.get() == self.tail.load(Ordering::Acquire) }
    }
}

impl<T> Default for MpscQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for MpscQueue<T> {
    fn drop(&mut self) {
        // Drop any undelivered values, then free the sentinel.
        while self.pop().is_some() {}
        unsafe {
            drop(Box::from_raw(*self.head.get()));
        }
    }
}

impl<T> std::fmt::Debug for MpscQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MpscQueue").finish_non_exhaustive()
    }
}
