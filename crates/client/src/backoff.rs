//! Exponential reconnect delay.

use std::time::Duration;

/// Delay before the first reconnect attempt.
pub const INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Doubling delay, capped at a maximum, reset after a success.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(max: Duration) -> Self {
        Self {
            current: INITIAL_DELAY.min(max),
            max,
        }
    }

    /// Delay to wait now; the following call returns double (up to the cap).
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = INITIAL_DELAY.min(self.max);
    }
}
