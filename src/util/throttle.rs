//! Cooldown gate in front of the engagement-decision request.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Minimum time between two engagement-decision attempts.
pub const ENGAGE_COOLDOWN: Duration = Duration::from_secs(15);

/// Outcome of asking the throttle for permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Proceed,
    Cooldown { remaining: Duration },
}

/// Timestamp gate keyed on attempt time.
///
/// A permitted attempt restarts the window whether or not the request it
/// guards succeeds. A rejected attempt leaves the window untouched.
#[derive(Debug)]
pub struct EngagementThrottle {
    cooldown: Duration,
    last_attempt: Mutex<Option<Instant>>,
}

impl Default for EngagementThrottle {
    fn default() -> Self {
        Self::new(ENGAGE_COOLDOWN)
    }
}

impl EngagementThrottle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_attempt: Mutex::new(None),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn try_acquire(&self) -> ThrottleDecision {
        self.try_acquire_at(Instant::now())
    }

    pub fn try_acquire_at(&self, now: Instant) -> ThrottleDecision {
        let mut last = self.last_attempt.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = *last {
            let elapsed = now.saturating_duration_since(previous);
            if elapsed < self.cooldown {
                return ThrottleDecision::Cooldown {
                    remaining: self.cooldown - elapsed,
                };
            }
        }
        *last = Some(now);
        ThrottleDecision::Proceed
    }
}
