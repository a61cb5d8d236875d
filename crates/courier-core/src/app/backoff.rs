//! Backoff policy: maps a retry count to a wait.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Growth {
    /// `base * (n + 1)`
    Linear,
    /// `base * multiplier^n`
    Exponential { multiplier: f64 },
}

/// Wait before redelivering a failed message.
///
/// `delay(n)` takes the number of retries already scheduled (0 for the first
/// retry) and never decreases as `n` grows. All arithmetic saturates.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub growth: Growth,
    /// Ceiling applied after growth.
    pub max_delay: Option<Duration>,
}

impl BackoffPolicy {
    pub fn linear(base: Duration) -> Self {
        Self {
            base,
            growth: Growth::Linear,
            max_delay: None,
        }
    }

    /// Multipliers below 1.0 (or NaN) are treated as 1.0 so the delay cannot shrink.
    pub fn exponential(base: Duration, multiplier: f64) -> Self {
        let multiplier = if multiplier.is_nan() {
            1.0
        } else {
            multiplier.max(1.0)
        };
        Self {
            base,
            growth: Growth::Exponential { multiplier },
            max_delay: None,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    pub fn delay(&self, n: u32) -> Duration {
        let raw = match self.growth {
            Growth::Linear => self.base.saturating_mul(n.saturating_add(1)),
            Growth::Exponential { multiplier } => {
                let exp = i32::try_from(n).unwrap_or(i32::MAX);
                let secs = self.base.as_secs_f64() * multiplier.powi(exp);
                Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
            }
        };
        match self.max_delay {
            Some(cap) => raw.min(cap),
            None => raw,
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::linear(Duration::from_secs(5))
    }
}
