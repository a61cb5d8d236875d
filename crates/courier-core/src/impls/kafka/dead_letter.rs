use std::time::Duration;

use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use tracing::debug;

use super::config::client_config;
use crate::config::KafkaSettings;
use crate::domain::{DeadLetterRecord, Topic};
use crate::error::{PublishError, TransportError};
use crate::ports::DeadLetterSink;

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Publishes dead-letter records as JSON, keyed by source coordinates.
pub struct KafkaDeadLetterSink {
    producer: FutureProducer,
}

impl KafkaDeadLetterSink {
    pub fn connect(settings: &KafkaSettings) -> Result<Self, TransportError> {
        let producer: FutureProducer = client_config(settings)
            .set("acks", "all")
            .set("enable.idempotence", "true")
            .set("message.timeout.ms", "30000")
            .create()
            .map_err(|e| TransportError::Poll(format!("failed to create dead-letter producer: {e}")))?;
        Ok(Self { producer })
    }
}

#[async_trait]
impl DeadLetterSink for KafkaDeadLetterSink {
    async fn publish(&self, topic: &Topic, record: &DeadLetterRecord) -> Result<(), PublishError> {
        let payload = serde_json::to_vec(record)?;
        let key = format!(
            "{}:{}:{}",
            record.source.topic, record.source.partition, record.source.offset
        );

        let outgoing = FutureRecord::to(topic.as_str()).key(&key).payload(&payload);
        self.producer
            .send(outgoing, Timeout::After(SEND_TIMEOUT))
            .await
            .map_err(|(e, _)| PublishError::Rejected {
                topic: topic.clone(),
                reason: e.to_string(),
            })?;

        debug!(dead_letter_id = %record.id, %topic, "dead-letter record delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeadLetterId, Message, MessageId};
    use crate::impls::kafka::KafkaLogConsumer;
    use crate::ports::LogConsumer;
    use chrono::{TimeZone, Utc};
    use rdkafka::mocking::MockCluster;
    use ulid::Ulid;

    #[tokio::test]
    async fn record_lands_on_dead_letter_topic_as_json() {
        let cluster = MockCluster::new(1).unwrap();
        cluster.create_topic("file-uploads.dlq", 1, 1).unwrap();
        let settings = KafkaSettings {
            brokers: cluster.bootstrap_servers(),
            topic: "file-uploads.dlq".into(),
            group_id: "dlq-reader".into(),
        };

        let source = Message::new(MessageId::new("file-uploads", 0, 3), br#"{"job_id":"j-3"}"#.to_vec());
        let record = DeadLetterRecord::new(
            DeadLetterId::from_ulid(Ulid::new()),
            &source,
            "analyzer timed out",
            4,
            Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        );

        let sink = KafkaDeadLetterSink::connect(&settings).unwrap();
        sink.publish(&Topic::new("file-uploads.dlq"), &record).await.unwrap();

        let reader = KafkaLogConsumer::connect(&settings).unwrap();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(30);
        let mut received = Vec::new();
        while received.is_empty() && tokio::time::Instant::now() < deadline {
            received = reader.poll(1, Duration::from_millis(500)).await.unwrap();
        }

        assert_eq!(received.len(), 1);
        assert_eq!(received[0].key(), Some(&b"file-uploads:0:3"[..]));
        let delivered: DeadLetterRecord = serde_json::from_slice(received[0].payload()).unwrap();
        assert_eq!(delivered, record);
    }

    #[tokio::test]
    async fn unreachable_broker_is_a_rejected_publish() {
        let settings = KafkaSettings {
            brokers: "127.0.0.1:1".into(),
            topic: "jobs".into(),
            group_id: "unused".into(),
        };
        let sink = KafkaDeadLetterSink {
            producer: client_config(&settings)
                .set("message.timeout.ms", "200")
                .create()
                .unwrap(),
        };
        let source = Message::new(MessageId::new("jobs", 0, 0), b"x".to_vec());
        let record = DeadLetterRecord::new(DeadLetterId::from_ulid(Ulid::new()), &source, "boom", 1, Utc::now());

        let err = sink.publish(&Topic::new("jobs.dlq"), &record).await.unwrap_err();
        assert!(matches!(err, PublishError::Rejected { ref topic, .. } if topic.as_str() == "jobs.dlq"));
    }
}
