//! Quiet-period scheduling for input-driven work.

use std::time::{Duration, Instant};

/// A single cancelable task that fires once input has been quiet for a while.
///
/// Every [`schedule`](Debouncer::schedule) replaces the pending payload and
/// restarts the quiet period, so only the last input is ever delivered.
#[derive(Debug)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<Pending<T>>,
}

#[derive(Debug)]
struct Pending<T> {
    deadline: Instant,
    payload: T,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Cancels any pending task and arms a new one.
    pub fn schedule(&mut self, payload: T, now: Instant) {
        self.pending = Some(Pending {
            deadline: now + self.quiet,
            payload,
        });
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.payload)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time left before the pending task fires, `None` when idle.
    pub fn time_remaining(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|p| p.deadline.saturating_duration_since(now))
    }

    /// Hands out the payload once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self.pending.as_ref().is_some_and(|p| now >= p.deadline);
        if due {
            self.pending.take().map(|p| p.payload)
        } else {
            None
        }
    }
}
