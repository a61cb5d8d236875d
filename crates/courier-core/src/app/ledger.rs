//! Retry ledger: failures per message since this engine started.
//!
//! # Why keyed by coordinates
//!
//! A redelivered message is a new read of the same `(topic, partition, offset)`,
//! so the coordinates are the only identity that survives a rewind. Payload
//! fields such as `job_id` are not trusted for this: an invalid payload has
//! none, and two uploads may reuse one.
//!
//! # Lifetime of an entry
//!
//! An entry appears on the first failure and is removed as soon as the message
//! resolves (success, skip or accepted dead letter). The map therefore holds at
//! most one entry per stalled partition, plus any whose dead-letter publish is
//! still outstanding.

use std::collections::HashMap;

use crate::domain::MessageId;

/// Attempt counts for messages that failed and are not yet resolved.
///
/// Owned by one delivery loop; not persisted, so a restart starts every
/// message from zero.
#[derive(Debug, Default)]
pub struct RetryLedger {
    attempts: HashMap<MessageId, u32>,
}

impl RetryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more failure; returns the new total.
    pub fn record_failure(&mut self, id: &MessageId) -> u32 {
        let count = self.attempts.entry(id.clone()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn attempts(&self, id: &MessageId) -> u32 {
        self.attempts.get(id).copied().unwrap_or(0)
    }

    pub fn clear(&mut self, id: &MessageId) {
        self.attempts.remove(id);
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}
