//! Thinking-time budget.
//!
//! A `Deadline` is started once per decision and copied into every task.
//! It is advisory: nothing is preempted, callers check it between evaluator
//! calls, so a decision may overrun by at most one evaluator latency.

use std::time::{Duration, Instant};

/// Stand-in for budgets too large to add to an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Monotonic wall-clock deadline for one decision.
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    started: Instant,
    expires: Instant,
}

impl Deadline {
    /// Start a deadline `budget` from now. Budgets past the clock's range
    /// are clamped to a century.
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        let started = Instant::now();
        let expires = started
            .checked_add(budget)
            .or_else(|| started.checked_add(FAR_FUTURE))
            .unwrap_or(started);
        Self { started, expires }
    }

    /// Has the budget run out?
    #[inline]
    #[must_use]
    pub fn expired(&self) -> bool {
        Instant::now() >= self.expires
    }

    /// Time left, zero once expired.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.expires.saturating_duration_since(Instant::now())
    }

    /// Time since the decision started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// The instant the budget runs out.
    #[must_use]
    pub fn instant(&self) -> Instant {
        self.expires
    }

    /// The cut-off for collecting results, `grace` past the deadline.
    #[must_use]
    pub fn collection_cutoff(&self, grace: Duration) -> Instant {
        self.expires.checked_add(grace).unwrap_or(self.expires)
    }
}
