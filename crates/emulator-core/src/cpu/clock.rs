//! Periodic clock and the tick gate it drives.
//!
//! The clock thread sleeps for one interval, then signals the gate. The
//! engine worker blocks on the gate and runs exactly one instruction cycle
//! per granted tick. Signals are counted, so a tick delivered while the
//! worker is busy is never lost.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Debug, Default)]
struct GateState {
    pending: u64,
    closed: bool,
    waiters: usize,
}

/// Counting wake-up gate between a tick source and the engine worker.
#[derive(Debug, Default)]
pub struct TickGate {
    state: Mutex<GateState>,
    wake: Condvar,
}

impl TickGate {
    /// Creates an open gate with no pending ticks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Grants one tick. Ignored once the gate is closed.
    pub fn signal(&self) {
        let mut state = self.lock();
        if state.closed {
            return;
        }
        state.pending += 1;
        self.wake.notify_one();
    }

    /// Blocks until a tick is available and consumes it.
    ///
    /// Returns `false` once the gate is closed and every tick granted before
    /// closing has been consumed.
    pub fn wait(&self) -> bool {
        let mut state = self.lock();
        loop {
            if state.pending > 0 {
                state.pending -= 1;
                return true;
            }
            if state.closed {
                return false;
            }
            state.waiters += 1;
            state = self
                .wake
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
            state.waiters -= 1;
        }
    }

    /// Closes the gate and wakes every waiter.
    pub fn close(&self) {
        self.lock().closed = true;
        self.wake.notify_all();
    }

    /// Returns true once [`Self::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Ticks granted but not yet consumed.
    #[must_use]
    pub fn pending(&self) -> u64 {
        self.lock().pending
    }

    /// Returns true while a caller is parked in [`Self::wait`].
    #[must_use]
    pub fn has_waiter(&self) -> bool {
        self.lock().waiters > 0
    }
}

/// Background thread that signals a [`TickGate`] once per interval.
#[derive(Debug)]
pub struct Clock {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Clock {
    /// Starts ticking `gate` every `interval`.
    #[must_use]
    pub fn start(interval: Duration, gate: Arc<TickGate>) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        tracing::debug!(?interval, "clock started");
        let handle = thread::spawn(move || {
            loop {
                thread::sleep(interval);
                if !flag.load(Ordering::Acquire) || gate.is_closed() {
                    break;
                }
                gate.signal();
            }
            tracing::debug!("clock thread exiting");
        });
        Self {
            running,
            handle: Some(handle),
        }
    }

    /// Returns true until [`Self::stop`] is called.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stops the clock and joins its thread. No tick is signalled after this
    /// returns.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("clock thread panicked");
            }
        }
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.stop();
    }
}
