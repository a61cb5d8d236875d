//! IdGenerator port
//!
//! # Implementations
//! - **UlidGenerator**: ULID whose time part comes from the injected [`Clock`]

use std::sync::Arc;

use ulid::Ulid;

use crate::domain::DeadLetterId;
use crate::ports::Clock;

pub trait IdGenerator: Send + Sync {
    fn generate_dead_letter_id(&self) -> DeadLetterId;
}

/// ULID-based generator.
///
/// With a [`FixedClock`](super::FixedClock) every id shares the same timestamp
/// part; the random part keeps them unique.
pub struct UlidGenerator {
    clock: Arc<dyn Clock>,
}

impl UlidGenerator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl IdGenerator for UlidGenerator {
    fn generate_dead_letter_id(&self) -> DeadLetterId {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        DeadLetterId::from(Ulid::from_parts(timestamp_ms, rand::random()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn generates_unique_ids() {
        let ids = UlidGenerator::new(Arc::new(SystemClock));
        let a = ids.generate_dead_letter_id();
        let b = ids.generate_dead_letter_id();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("dlq-"));
    }

    #[test]
    fn timestamp_part_follows_the_clock() {
        let fixed = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let ids = UlidGenerator::new(Arc::new(FixedClock::new(fixed)));

        let a = ids.generate_dead_letter_id();
        let b = ids.generate_dead_letter_id();
        assert_ne!(a, b);
        assert_eq!(a.as_ulid().timestamp_ms(), fixed.timestamp_millis() as u64);
        assert_eq!(b.as_ulid().timestamp_ms(), fixed.timestamp_millis() as u64);
    }
}
