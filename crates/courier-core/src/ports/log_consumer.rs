//! LogConsumer port - the partitioned, offset-addressed log.
//!
//! # Implementations
//! - **InMemoryLog**: tests and the local demo
//! - **KafkaLogConsumer** (feature `kafka`): `StreamConsumer` with manual commits
//!
//! Retries are built on `seek`, so an implementation must make a rewound
//! offset visible to the very next `poll`.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Message, TopicPartition};
use crate::error::TransportError;

/// Manual-commit consumer of a partitioned log.
///
/// # Contract
/// - `poll` returns at most `max_messages`, in offset order per partition; an
///   empty batch after `timeout` is normal
/// - `seek` rewinds a partition so the next poll starts at `offset`; messages
///   already fetched past that point are discarded
/// - `commit` records `next_offset` as the resume point for the group
/// - auto-commit is never used
#[async_trait]
pub trait LogConsumer: Send + Sync {
    async fn poll(
        &self,
        max_messages: usize,
        timeout: Duration,
    ) -> Result<Vec<Message>, TransportError>;

    async fn seek(&self, partition: &TopicPartition, offset: i64) -> Result<(), TransportError>;

    async fn commit(
        &self,
        partition: &TopicPartition,
        next_offset: i64,
    ) -> Result<(), TransportError>;
}
