//! Debounced task scheduling.
//!
//! Edits arrive in bursts: every keystroke in a dish title marks its page
//! changed. The layout pass runs once the edits stop for a configured
//! delay. Scheduling again before the deadline replaces the pending task and
//! pushes the deadline back.
//!
//! The debouncer never reads the clock itself; callers pass `now`, which
//! keeps it deterministic under test.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace any pending task with `task`, due `delay` after `now`.
    pub fn schedule(&mut self, now: Instant, task: T) {
        self.pending = Some((now + self.delay, task));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending task becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(at, _)| *at)
    }

    /// Take the pending task if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((at, _)) if *at <= now => self.pending.take().map(|(_, task)| task),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
