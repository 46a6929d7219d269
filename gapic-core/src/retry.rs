//! # Retry Policies
//!
//! A [`RetryPolicy`] decides which failures are worth another attempt and how long to wait
//! before making it. The decision is an explicit [`RetryDecision`] value; the loop that acts on
//! it lives in [`crate::wrapper`].
use std::time::Duration;
use tonic::Code;

/// Delay schedule that grows exponentially up to a cap.
///
/// Yields `initial, initial * multiplier, ...` with every value clamped to `max`. The iterator
/// never ends; budgets are enforced by the caller.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    multiplier: f64,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, multiplier: f64, max: Duration) -> Self {
        Self {
            next: initial.min(max),
            multiplier: multiplier.max(1.0),
            max,
        }
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next;
        self.next = Duration::try_from_secs_f64(current.as_secs_f64() * self.multiplier)
            .unwrap_or(self.max)
            .min(self.max);
        Some(current)
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the given delay, then try again.
    Retry(Duration),
    /// The failure is not retryable; surface it as is.
    GiveUp,
    /// The failure is retryable but the attempt or time budget is spent.
    Exhausted,
}

/// Which errors to retry and the backoff schedule / budget to retry them with.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    retryable_codes: Vec<Code>,
    initial_delay: Duration,
    multiplier: f64,
    max_delay: Duration,
    max_elapsed: Option<Duration>,
    max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    /// Retries transient failures (`UNAVAILABLE`, `INTERNAL`, `RESOURCE_EXHAUSTED`) for up to
    /// two minutes, starting at one second and doubling up to one minute between attempts.
    fn default() -> Self {
        Self {
            retryable_codes: vec![Code::Unavailable, Code::Internal, Code::ResourceExhausted],
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(60),
            max_elapsed: Some(Duration::from_secs(120)),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self {
            retryable_codes: Vec::new(),
            max_attempts: Some(1),
            ..Self::default()
        }
    }

    pub fn with_retryable_codes(mut self, codes: impl IntoIterator<Item = Code>) -> Self {
        self.retryable_codes = codes.into_iter().collect();
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Growth factor between consecutive delays. Values below `1.0` are treated as `1.0`.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Wall-clock budget across all attempts and sleeps. `None` removes the limit.
    pub fn with_max_elapsed(mut self, budget: Option<Duration>) -> Self {
        self.max_elapsed = budget;
        self
    }

    /// Upper bound on the number of attempts, the first one included. `None` removes the limit.
    pub fn with_max_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn retryable_codes(&self) -> &[Code] {
        &self.retryable_codes
    }

    pub fn max_elapsed(&self) -> Option<Duration> {
        self.max_elapsed
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    pub fn is_retryable(&self, code: Code) -> bool {
        self.retryable_codes.contains(&code)
    }

    /// Returns a fresh delay schedule for one call.
    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.initial_delay, self.multiplier, self.max_delay)
    }

    /// Decides what follows a failed attempt.
    ///
    /// # Arguments
    ///
    /// * `code` - Status code of the failure.
    /// * `attempts` - Attempts made so far, the failed one included.
    /// * `elapsed` - Time since the first attempt started.
    /// * `delay` - The next delay of this call's [`Backoff`].
    pub fn decide(
        &self,
        code: Code,
        attempts: u32,
        elapsed: Duration,
        delay: Duration,
    ) -> RetryDecision {
        if !self.is_retryable(code) {
            return RetryDecision::GiveUp;
        }

        if self.max_attempts.is_some_and(|max| attempts >= max) {
            return RetryDecision::Exhausted;
        }

        if self
            .max_elapsed
            .is_some_and(|budget| elapsed + delay >= budget)
        {
            return RetryDecision::Exhausted;
        }

        RetryDecision::Retry(delay)
    }
}
