use chrono::{DateTime, Utc};

use super::ids::{MessageId, Topic, TopicPartition};

/// A record read from the log. Immutable once read.
///
/// The payload is kept as raw bytes; decoding it into a [`JobRecord`](super::JobRecord)
/// is part of delivery, so a malformed payload is an outcome rather than a read error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    key: Option<Vec<u8>>,
    payload: Vec<u8>,
    timestamp: Option<DateTime<Utc>>,
}

impl Message {
    pub fn new(id: MessageId, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            key: None,
            payload: payload.into(),
            timestamp: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn topic(&self) -> &Topic {
        &self.id.topic
    }

    pub fn partition(&self) -> i32 {
        self.id.partition
    }

    pub fn offset(&self) -> i64 {
        self.id.offset
    }

    pub fn topic_partition(&self) -> TopicPartition {
        self.id.topic_partition()
    }

    pub fn key(&self) -> Option<&[u8]> {
        self.key.as_deref()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Broker timestamp, when the transport provides one.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }
}
