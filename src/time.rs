//! Time abstraction traits for platform-agnostic timing, plus the deadline
//! used by every bounded wait in the controller.

/// Trait for abstracting time sources.
pub trait TimeSource<I: TimeInstant> {
    /// Returns the current time instant.
    fn now(&self) -> I;
}

/// Trait abstraction for duration types.
pub trait TimeDuration: Copy {
    /// Converts duration to milliseconds.
    fn as_millis(&self) -> u64;
}

/// Trait abstraction for instant types.
pub trait TimeInstant: Copy {
    /// Duration type for this instant.
    type Duration: TimeDuration;

    /// Calculates duration since an earlier instant.
    ///
    /// Implementations backed by a wrapping counter should use wrapping
    /// arithmetic so deadlines survive a counter rollover.
    fn duration_since(&self, earlier: Self) -> Self::Duration;
}

/// A fixed budget measured from the instant it was armed.
#[derive(Debug, Clone, Copy)]
pub struct Deadline<I: TimeInstant> {
    start: I,
    budget_ms: u64,
}

impl<I: TimeInstant> Deadline<I> {
    /// Arms a deadline `budget_ms` milliseconds after `start`.
    pub fn new(start: I, budget_ms: u64) -> Self {
        Self { start, budget_ms }
    }

    /// Milliseconds elapsed since the deadline was armed.
    pub fn elapsed_ms(&self, now: I) -> u64 {
        now.duration_since(self.start).as_millis()
    }

    /// Returns true once the budget is used up.
    pub fn has_expired(&self, now: I) -> bool {
        self.elapsed_ms(now) >= self.budget_ms
    }
}
