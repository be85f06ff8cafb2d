//! Spin-then-yield backoff for the polling worker loops.

use std::hint::spin_loop;
use std::thread;

/// Backoff for workers that poll a lock-free queue instead of blocking.
///
/// Escalates from busy spinning to cooperative yields, but never sleeps:
/// the fine-grained pools trade idle CPU for wake-up latency, and a
/// sleeping worker would break that contract.
#[derive(Debug)]
pub struct Backoff {
    step: u32,
}

impl Backoff {
    const SPIN_LIMIT: u32 = 6;

    pub fn new() -> Self {
        Self { step: 0 }
    }

    /// Called after a task was found; the next idle stretch starts cheap.
    pub fn reset(&mut self) {
        self.step = 0;
    }

    /// Perform one idle step.
    pub fn snooze(&mut self) {
        if self.step < Self::SPIN_LIMIT {
            for _ in 0..(1 << self.step) {
                spin_loop();
            }
            self.step += 1;
        } else {
            thread::yield_now();
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}
