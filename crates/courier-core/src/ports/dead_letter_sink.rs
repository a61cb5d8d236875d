//! DeadLetterSink port
//!
//! # Implementations
//! - **InMemoryDeadLetterSink**: records every publish, can reject on demand
//! - **KafkaDeadLetterSink** (feature `kafka`): JSON records on `<topic>.dlq`

use async_trait::async_trait;

use crate::domain::{DeadLetterRecord, Topic};
use crate::error::PublishError;

/// Producer side of the dead-letter channel.
///
/// `Ok` means the record is durable on `topic`; the loop commits the source
/// offset only after that.
///
/// The same record may be published more than once when an earlier attempt
/// failed or timed out, so downstream readers should dedupe on `record.id`.
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    async fn publish(&self, topic: &Topic, record: &DeadLetterRecord) -> Result<(), PublishError>;
}
