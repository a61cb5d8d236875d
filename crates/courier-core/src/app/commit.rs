//! Commit discipline: an offset advances only once its message is resolved.
//!
//! # Commit point semantics
//!
//! The committed value is the *next* offset to read (`offset + 1`), matching
//! what a restarted consumer group resumes from. Because messages of one
//! partition are resolved strictly in order, committing after each resolved
//! message never skips an unresolved one.
//!
//! # Monotonicity
//!
//! The transport can hand an already committed message back to the loop, for
//! example when a rebalance replays a partition. Resolving it again must not move the
//! group backwards, so the last point sent per partition is remembered and
//! anything at or below it is answered with [`CommitOutcome::AlreadyCommitted`]
//! without touching the transport.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::domain::{Message, TopicPartition};
use crate::error::TransportError;
use crate::ports::LogConsumer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The commit point moved to `next_offset`.
    Advanced { next_offset: i64 },
    /// The point was already at or past this message; nothing was sent.
    AlreadyCommitted,
}

/// Tracks the commit point per partition and forwards commits to the consumer.
///
/// Commit points never move backwards.
pub struct CommitDiscipline {
    consumer: Arc<dyn LogConsumer>,
    points: HashMap<TopicPartition, i64>,
}

impl CommitDiscipline {
    pub fn new(consumer: Arc<dyn LogConsumer>) -> Self {
        Self {
            consumer,
            points: HashMap::new(),
        }
    }

    /// Commit `message.offset + 1` for the message's partition.
    ///
    /// Only for messages with a terminal outcome.
    pub async fn resolve(&mut self, message: &Message) -> Result<CommitOutcome, TransportError> {
        let tp = message.topic_partition();
        let next_offset = message.offset().saturating_add(1);

        if self.points.get(&tp).is_some_and(|&point| point >= next_offset) {
            return Ok(CommitOutcome::AlreadyCommitted);
        }

        self.consumer.commit(&tp, next_offset).await?;
        debug!(
            topic = %tp.topic,
            partition = tp.partition,
            next_offset,
            "offset committed"
        );
        self.points.insert(tp, next_offset);
        Ok(CommitOutcome::Advanced { next_offset })
    }

    pub fn committed(&self, tp: &TopicPartition) -> Option<i64> {
        self.points.get(tp).copied()
    }
}
