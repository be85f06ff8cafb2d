//! Pool lifecycle: startup mode and the shared status state machine.
//!
//! Every pool in this crate runs the same three-state machine:
//! `Prepare` -> `Running` -> `Exit`, with no backward transitions.
//! `Prepare` is only reachable in [`Mode::Batch`]; a pool built in
//! [`Mode::Stream`] starts directly in `Running`.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU8, Ordering};

/// Startup mode, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Workers start executing tasks immediately.
    Stream,
    /// Workers hold until the pool is explicitly released with `begin()`.
    Batch,
}

/// Pool status, observed concurrently by every worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Prepare = 0,
    Running = 1,
    Exit = 2,
}

/// Atomic cell holding a [`Status`], with acquire/release ordering so
/// transitions are visible to all workers without a data race.
#[derive(Debug)]
struct AtomicStatus(AtomicU8);

impl AtomicStatus {
    fn new(status: Status) -> Self {
        Self(AtomicU8::new(status as u8))
    }

    fn load(&self) -> Status {
        match self.0.load(Ordering::Acquire) {
            0 => Status::Prepare,
            1 => Status::Running,
            _ => Status::Exit,
        }
    }

    fn store(&self, status: Status) {
        self.0.store(status as u8, Ordering::Release);
    }

    fn try_transition(&self, from: Status, to: Status) -> std::result::Result<(), Status> {
        match self
            .0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(()),
            Err(1) => Err(Status::Running),
            Err(2) => Err(Status::Exit),
            Err(_) => Err(Status::Prepare),
        }
    }
}

/// Lifecycle state shared by one pool instance and all of its workers.
///
/// The batch-mode startup gate is a real blocking wait, not a spin: workers
/// park on a condvar until `begin()` (or `exit()`) moves the status out of
/// `Prepare`.
#[derive(Debug)]
pub(crate) struct PoolLifecycle {
    status: AtomicStatus,
    gate: Mutex<()>,
    released: Condvar,
}

impl PoolLifecycle {
    pub(crate) fn new(mode: Mode) -> Self {
        let initial = match mode {
            Mode::Stream => Status::Running,
            Mode::Batch => Status::Prepare,
        };
        Self {
            status: AtomicStatus::new(initial),
            gate: Mutex::new(()),
            released: Condvar::new(),
        }
    }

    pub(crate) fn status(&self) -> Status {
        self.status.load()
    }

    pub(crate) fn is_exiting(&self) -> bool {
        self.status.load() == Status::Exit
    }

    /// Releases a batch-mode pool. No-op if already running; calling after
    /// `exit()` is a contract violation.
    pub(crate) fn begin(&self) {
        match self.status.try_transition(Status::Prepare, Status::Running) {
            Ok(()) | Err(Status::Running) => {
                let _guard = self.gate.lock();
                self.released.notify_all();
            }
            Err(_) => panic!("begin() called on a pool that has already exited"),
        }
    }

    /// Moves the pool to `Exit`. Idempotent; also releases any worker still
    /// parked at the startup gate.
    pub(crate) fn exit(&self) {
        self.status.store(Status::Exit);
        let _guard = self.gate.lock();
        self.released.notify_all();
    }

    /// Blocks the calling worker until the status leaves `Prepare`.
    pub(crate) fn wait_for_start(&self) {
        if self.status.load() != Status::Prepare {
            return;
        }
        let mut guard = self.gate.lock();
        while self.status.load() == Status::Prepare {
            self.released.wait(&mut guard);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_stream_starts_running() {
        let lifecycle = PoolLifecycle::new(Mode::Stream);
        assert_eq!(lifecycle.status(), Status::Running);
    }

    #[test]
    fn test_batch_starts_prepared() {
        let lifecycle = PoolLifecycle::new(Mode::Batch);
        assert_eq!(lifecycle.status(), Status::Prepare);
        lifecycle.begin();
        assert_eq!(lifecycle.status(), Status::Running);
    }

    #[test]
    fn test_begin_is_idempotent_while_running() {
        let lifecycle = PoolLifecycle::new(Mode::Stream);
        lifecycle.begin();
        lifecycle.begin();
        assert_eq!(lifecycle.status(), Status::Running);
    }

    #[test]
    #[should_panic(expected = "already exited")]
    fn test_begin_after_exit_panics() {
        let lifecycle = PoolLifecycle::new(Mode::Stream);
        lifecycle.exit();
        lifecycle.begin();
    }

    #[test]
    fn test_exit_is_idempotent() {
        let lifecycle = PoolLifecycle::new(Mode::Batch);
        lifecycle.exit();
        lifecycle.exit();
        assert!(lifecycle.is_exiting());
    }

    #[test]
    fn test_gate_blocks_until_released() {
        let lifecycle = Arc::new(PoolLifecycle::new(Mode::Batch));
        let observed = Arc::new(std::sync::atomic::AtomicBool::new(false));

        let handle = {
            let lifecycle = lifecycle.clone();
            let observed = observed.clone();
            thread::spawn(move || {
                lifecycle.wait_for_start();
                observed.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!observed.load(Ordering::SeqCst));

        lifecycle.begin();
        handle.join().unwrap();
        assert!(observed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_exit_releases_gate() {
        let lifecycle = Arc::new(PoolLifecycle::new(Mode::Batch));
        let handle = {
            let lifecycle = lifecycle.clone();
            thread::spawn(move || lifecycle.wait_for_start())
        };
        thread::sleep(Duration::from_millis(20));
        lifecycle.exit();
        handle.join().unwrap();
    }
}
