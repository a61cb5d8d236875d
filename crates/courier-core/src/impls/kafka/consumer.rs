//! Kafka [`LogConsumer`].
//!
//! # Batching
//!
//! `StreamConsumer` yields one message at a time. `poll` waits up to the
//! caller's timeout for the first message, then keeps reading for at most
//! [`BATCH_LINGER`] so a busy topic fills a batch without an idle one adding
//! latency.
//!
//! # Offsets
//!
//! Both auto-commit and the automatic offset store are off. The broker only
//! learns about progress through [`LogConsumer::commit`], which is synchronous
//! so a returned `Ok` means the group offset is durable.

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::BorrowedMessage;
use rdkafka::util::Timeout;
use rdkafka::{Message as _, Offset, TopicPartitionList};
use tokio::time::Instant;
use tracing::info;

use super::config::client_config;
use crate::config::KafkaSettings;
use crate::domain::{Message, MessageId, Topic, TopicPartition};
use crate::error::TransportError;
use crate::ports::LogConsumer;

/// Once the first message of a batch arrives, wait at most this long for more.
const BATCH_LINGER: Duration = Duration::from_millis(20);
const SEEK_TIMEOUT: Duration = Duration::from_secs(5);

pub struct KafkaLogConsumer {
    consumer: StreamConsumer,
}

impl KafkaLogConsumer {
    /// Create the consumer and subscribe to the configured topic.
    ///
    /// # Configuration
    /// - `enable.auto.commit=false`: offsets move only through [`LogConsumer::commit`]
    /// - `auto.offset.reset=earliest`: a new group starts at the beginning
    pub fn connect(settings: &KafkaSettings) -> Result<Self, TransportError> {
        let consumer: StreamConsumer = client_config(settings)
            .set("group.id", &settings.group_id)
            .set("enable.auto.commit", "false")
            .set("enable.auto.offset.store", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "30000")
            .set("max.poll.interval.ms", "300000")
            .create()
            .map_err(|e| TransportError::Poll(format!("failed to create consumer: {e}")))?;

        consumer
            .subscribe(&[&settings.topic])
            .map_err(|e| TransportError::Poll(format!("failed to subscribe to {}: {e}", settings.topic)))?;

        info!(
            brokers = %settings.brokers,
            topic = %settings.topic,
            group_id = %settings.group_id,
            "kafka consumer subscribed"
        );
        Ok(Self { consumer })
    }
}

fn to_message(m: &BorrowedMessage<'_>) -> Message {
    let id = MessageId::new(Topic::new(m.topic()), m.partition(), m.offset());
    let mut message = Message::new(id, m.payload().map(<[u8]>::to_vec).unwrap_or_default());
    if let Some(key) = m.key() {
        message = message.with_key(key.to_vec());
    }
    if let Some(ts) = m.timestamp().to_millis().and_then(DateTime::from_timestamp_millis) {
        message = message.with_timestamp(ts);
    }
    message
}

#[async_trait]
impl LogConsumer for KafkaLogConsumer {
    async fn poll(
        &self,
        max_messages: usize,
        timeout: Duration,
    ) -> Result<Vec<Message>, TransportError> {
        let mut batch = Vec::new();

        let first = match tokio::time::timeout(timeout, self.consumer.recv()).await {
            Err(_) => return Ok(batch),
            Ok(received) => received.map_err(|e| TransportError::Poll(e.to_string()))?,
        };
        batch.push(to_message(&first));
        drop(first);

        let linger_until = Instant::now() + BATCH_LINGER;
        while batch.len() < max_messages {
            match tokio::time::timeout_at(linger_until, self.consumer.recv()).await {
                Err(_) => break,
                Ok(received) => {
                    let m = received.map_err(|e| TransportError::Poll(e.to_string()))?;
                    batch.push(to_message(&m));
                }
            }
        }
        Ok(batch)
    }

    async fn seek(&self, tp: &TopicPartition, offset: i64) -> Result<(), TransportError> {
        self.consumer
            .seek(
                tp.topic.as_str(),
                tp.partition,
                Offset::Offset(offset),
                Timeout::After(SEEK_TIMEOUT),
            )
            .map_err(|e| TransportError::Seek {
                partition: tp.to_string(),
                offset,
                reason: e.to_string(),
            })
    }

    async fn commit(&self, tp: &TopicPartition, next_offset: i64) -> Result<(), TransportError> {
        let commit_err = |reason: String| TransportError::Commit {
            partition: tp.to_string(),
            offset: next_offset,
            reason,
        };

        let mut offsets = TopicPartitionList::new();
        offsets
            .add_partition_offset(tp.topic.as_str(), tp.partition, Offset::Offset(next_offset))
            .map_err(|e| commit_err(e.to_string()))?;
        self.consumer
            .commit(&offsets, CommitMode::Sync)
            .map_err(|e| commit_err(e.to_string()))
    }
}
