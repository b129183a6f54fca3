//! One-shot timers backed by tokio tasks.
//!
//! A timer settles exactly once: either it is cancelled, or its expiry is
//! claimed. The spawned task only wakes the owner; the owner claims the
//! expiry with [`TurnTimer::expire`] while holding its own lock, so a timer
//! that loses a race against a normal turn end is recognized as stale.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

const ARMED: u8 = 0;
const CANCELLED: u8 = 1;
const EXPIRED: u8 = 2;

/// Handle to a pending wake-up. Dropping it aborts the task.
#[derive(Debug)]
pub(crate) struct TurnTimer {
    state: Arc<AtomicU8>,
    task: JoinHandle<()>,
}

impl TurnTimer {
    /// Schedules `on_expire` to run once after `duration` on `runtime`.
    ///
    /// The caller does not need to be inside the runtime.
    pub(crate) fn arm<F>(runtime: &Handle, duration: Duration, on_expire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let state = Arc::new(AtomicU8::new(ARMED));
        let task_state = Arc::clone(&state);
        let task = runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            if task_state.load(Ordering::Acquire) == ARMED {
                trace!(?duration, "Timer woke");
                on_expire();
            }
        });
        Self { state, task }
    }

    /// Stops the timer. Returns false if its expiry was already claimed.
    pub(crate) fn cancel(self) -> bool {
        self.state
            .compare_exchange(ARMED, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Claims the expiry. Returns false if the timer was cancelled first.
    pub(crate) fn expire(&self) -> bool {
        self.state
            .compare_exchange(ARMED, EXPIRED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Drop for TurnTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
