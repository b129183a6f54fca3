//! Per-color chess clock.
//!
//! Each color banks its own remaining time. Starting a turn turns the
//! remaining time into an absolute deadline and arms a timer for it; ending
//! the turn converts whatever is left of the deadline back into remaining
//! time. Unused time carries over to the next turn.

use crate::timer::TurnTimer;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// One color's score and clock.
///
/// At most one turn can be running at a time. Starting a second turn, or
/// finding that a running turn's timer expired underneath a normal turn end,
/// means the caller lost track of whose clock is running; both are treated
/// as fatal.
#[derive(Debug)]
pub struct AgentClock {
    score: u32,
    remaining: Duration,
    deadline: Option<Instant>,
    timer: Option<TurnTimer>,
}

impl AgentClock {
    /// Creates an idle clock holding `time_control` of thinking time.
    pub fn new(time_control: Duration) -> Self {
        Self {
            score: 0,
            remaining: time_control,
            deadline: None,
            timer: None,
        }
    }

    /// Red marbles pushed off by this color.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Banked time as of the last turn end.
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Absolute deadline of the running turn.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true while a turn is running.
    pub fn is_running(&self) -> bool {
        self.timer.is_some() || self.deadline.is_some()
    }

    /// Time left right now, counting down while a turn runs.
    pub fn time_left(&self) -> Duration {
        match self.deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => self.remaining,
        }
    }

    pub(crate) fn add_point(&mut self) {
        self.score += 1;
    }

    /// Starts this color's turn. `on_timeout` runs once, on a timer task
    /// spawned onto `runtime`, if the turn is not ended before the banked
    /// time runs out.
    ///
    /// # Panics
    ///
    /// Panics if a turn is already running.
    #[instrument(skip(self, runtime, on_timeout), fields(remaining = ?self.remaining))]
    pub fn start_turn<F>(&mut self, runtime: &Handle, on_timeout: F)
    where
        F: FnOnce() + Send + 'static,
    {
        assert!(
            !self.is_running(),
            "turn clock started twice without ending the previous turn"
        );
        self.deadline = Some(Instant::now() + self.remaining);
        self.timer = Some(TurnTimer::arm(runtime, self.remaining, on_timeout));
        debug!("Turn clock started");
    }

    /// Stops the running turn and banks the unused time. Does nothing if no
    /// turn is running.
    ///
    /// # Panics
    ///
    /// Panics if the turn's timeout had already been claimed.
    #[instrument(skip(self))]
    pub fn end_turn(&mut self) {
        if let Some(timer) = self.timer.take() {
            assert!(timer.cancel(), "turn timer expired before the turn ended");
        }
        if let Some(deadline) = self.deadline.take() {
            self.remaining = deadline.saturating_duration_since(Instant::now());
            debug!(remaining = ?self.remaining, "Turn clock stopped");
        }
    }

    /// Claims the running turn's timeout. Returns false if there is no
    /// running timer or it was already cancelled.
    pub(crate) fn expire(&mut self) -> bool {
        if !self.timer.as_ref().is_some_and(TurnTimer::expire) {
            return false;
        }
        self.timer = None;
        self.deadline = None;
        self.remaining = Duration::ZERO;
        true
    }

    /// Stops the clock during teardown.
    ///
    /// # Panics
    ///
    /// Panics if the turn's timeout was claimed but never cleared.
    pub(crate) fn halt(&mut self) {
        if let Some(timer) = self.timer.take() {
            assert!(timer.cancel(), "turn timer expired during teardown");
        }
        if let Some(deadline) = self.deadline.take() {
            self.remaining = deadline.saturating_duration_since(Instant::now());
        }
    }
}
