use chrono::{DateTime, Duration, Utc};

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

/// Seconds allotted per question when a pass is timed without an explicit limit.
pub const SECONDS_PER_QUESTION: i64 = 36;

/// Default limit for a timed pass of `count` questions (1080 s for 30).
#[must_use]
pub fn time_limit_for(count: usize) -> Duration {
    let count = i64::try_from(count).unwrap_or(i64::MAX / SECONDS_PER_QUESTION);
    Duration::seconds(count.saturating_mul(SECONDS_PER_QUESTION))
}

//
// ─── PASS TIMER ────────────────────────────────────────────────────────────────
//

/// Active-time stopwatch for one pass, with an optional limit.
///
/// Elapsed time is the sum of all running intervals; paused stretches do not
/// count toward the limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassTimer {
    limit: Option<Duration>,
    resumed_at: Option<DateTime<Utc>>,
    accumulated: Duration,
}

impl PassTimer {
    #[must_use]
    pub fn start(now: DateTime<Utc>, limit: Option<Duration>) -> Self {
        Self {
            limit,
            resumed_at: Some(now),
            accumulated: Duration::zero(),
        }
    }

    #[must_use]
    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.resumed_at.is_none()
    }

    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        match self.resumed_at {
            Some(resumed) => self.accumulated + (now - resumed).max(Duration::zero()),
            None => self.accumulated,
        }
    }

    /// Time left before the limit, clamped at zero. `None` for untimed passes.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.limit
            .map(|limit| (limit - self.elapsed(now)).max(Duration::zero()))
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.limit.is_some_and(|limit| self.elapsed(now) >= limit)
    }

    /// Stop accumulating time. Returns false if already paused.
    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        match self.resumed_at.take() {
            Some(resumed) => {
                self.accumulated += (now - resumed).max(Duration::zero());
                true
            }
            None => false,
        }
    }

    /// Start a new running interval at `now`. Returns false if already running.
    pub fn resume(&mut self, now: DateTime<Utc>) -> bool {
        if self.resumed_at.is_some() {
            return false;
        }
        self.resumed_at = Some(now);
        true
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
