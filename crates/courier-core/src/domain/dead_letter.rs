//! Dead-letter record: an exhausted message plus the context needed to inspect it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::{DeadLetterId, Topic};
use super::message::Message;

/// Where the dead-lettered message sat in the source log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCoordinates {
    pub topic: Topic,
    pub partition: i32,
    pub offset: i64,
    /// Partitioning key of the source message, as lossy UTF-8.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Created exactly once per message that exhausts its retry budget and never
/// mutated afterwards. A publish that has to be repeated re-sends this same
/// value, so `id` identifies the dead letter across duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetterRecord {
    pub id: DeadLetterId,
    pub source: SourceCoordinates,

    /// The original payload: embedded as JSON when it parses, otherwise as
    /// lossy UTF-8 text.
    pub payload: Value,

    /// Last failure reported by the processor.
    pub cause: String,

    /// Processing attempts made before giving up.
    pub attempts: u32,

    pub dead_lettered_at: DateTime<Utc>,
}

impl DeadLetterRecord {
    pub fn new(
        id: DeadLetterId,
        message: &Message,
        cause: impl Into<String>,
        attempts: u32,
        dead_lettered_at: DateTime<Utc>,
    ) -> Self {
        let payload = serde_json::from_slice(message.payload()).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(message.payload()).into_owned())
        });

        Self {
            id,
            source: SourceCoordinates {
                topic: message.topic().clone(),
                partition: message.partition(),
                offset: message.offset(),
                key: message
                    .key()
                    .map(|k| String::from_utf8_lossy(k).into_owned()),
                timestamp: message.timestamp(),
            },
            payload,
            cause: cause.into(),
            attempts,
            dead_lettered_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageId;
    use chrono::TimeZone;
    use serde_json::json;
    use ulid::Ulid;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn embeds_json_payload_and_coordinates() {
        let message = Message::new(
            MessageId::new("file-uploads", 2, 41),
            br#"{"job_id":"j-1","content_ref":"a.txt"}"#.to_vec(),
        )
        .with_key(b"j-1".to_vec())
        .with_timestamp(at());

        let record = DeadLetterRecord::new(
            DeadLetterId::from_ulid(Ulid::new()),
            &message,
            "analyzer timed out",
            4,
            at(),
        );

        assert_eq!(record.payload, json!({ "job_id": "j-1", "content_ref": "a.txt" }));
        assert_eq!(record.source.topic.as_str(), "file-uploads");
        assert_eq!(record.source.partition, 2);
        assert_eq!(record.source.offset, 41);
        assert_eq!(record.source.key.as_deref(), Some("j-1"));
        assert_eq!(record.source.timestamp, Some(at()));
        assert_eq!(record.attempts, 4);

        let wire: Value = serde_json::to_value(&record).unwrap();
        assert_eq!(wire["cause"], "analyzer timed out");
        assert_eq!(wire["source"]["topic"], "file-uploads");
    }

    #[test]
    fn keeps_non_json_payload_as_text() {
        let message = Message::new(MessageId::new("t", 0, 0), b"not json".to_vec());
        let record =
            DeadLetterRecord::new(DeadLetterId::from_ulid(Ulid::new()), &message, "x", 1, at());
        assert_eq!(record.payload, json!("not json"));
        assert!(record.source.timestamp.is_none());

        let wire: Value = serde_json::to_value(&record).unwrap();
        assert!(wire["source"].get("key").is_none());
    }
}
