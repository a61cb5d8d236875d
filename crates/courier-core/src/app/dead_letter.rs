//! Dead-letter router.
//!
//! # Building versus publishing
//!
//! A record is built exactly once, when a message runs out of retries, and is
//! never mutated afterwards. Publishing is a separate step that may be repeated:
//! if the channel rejects a record (or times out after actually writing it), the
//! loop keeps the same record and offers it again on redelivery. Consumers of the
//! dead-letter channel can therefore dedupe on `id`.

use std::sync::Arc;

use tracing::info;

use crate::domain::{DeadLetterRecord, Message};
use crate::error::Undelivered;
use crate::ports::{Clock, DeadLetterSink, IdGenerator};

/// Publishes exhausted messages to `<source topic>.dlq`.
///
/// A failed publish is returned as is; redelivery is the retry.
pub struct DeadLetterRouter {
    sink: Arc<dyn DeadLetterSink>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl DeadLetterRouter {
    pub fn new(sink: Arc<dyn DeadLetterSink>, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { sink, clock, ids }
    }

    /// Stamp a fresh record for `message`. Call once per exhausted message.
    pub fn build(&self, message: &Message, cause: &str, attempts: u32) -> DeadLetterRecord {
        DeadLetterRecord::new(
            self.ids.generate_dead_letter_id(),
            message,
            cause,
            attempts,
            self.clock.now(),
        )
    }

    /// Build a record for `message` and publish it.
    pub async fn route(
        &self,
        message: &Message,
        cause: &str,
        attempts: u32,
    ) -> Result<DeadLetterRecord, Undelivered> {
        self.publish(self.build(message, cause, attempts)).await
    }

    /// Offer `record` to the sibling channel of its source topic.
    ///
    /// The record comes back on both paths; on failure it is the one to
    /// offer again.
    pub async fn publish(&self, record: DeadLetterRecord) -> Result<DeadLetterRecord, Undelivered> {
        let topic = record.source.topic.dead_letter();

        if let Err(source) = self.sink.publish(&topic, &record).await {
            return Err(Undelivered {
                record: Box::new(record),
                source,
            });
        }
        info!(
            dead_letter_id = %record.id,
            topic = %record.source.topic,
            partition = record.source.partition,
            offset = record.source.offset,
            attempts = record.attempts,
            "message dead-lettered"
        );
        Ok(record)
    }
}
