//! In-memory partitioned log.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::domain::{Message, MessageId, Topic, TopicPartition};
use crate::error::TransportError;
use crate::ports::LogConsumer;

/// One partition: messages starting at `base`, a read position and a commit point.
struct PartitionLog {
    messages: Vec<Message>,
    base: i64,
    /// Next offset `poll` will return.
    position: i64,
    committed: Option<i64>,
}

impl PartitionLog {
    fn new(base: i64) -> Self {
        Self {
            messages: Vec::new(),
            base,
            position: base,
            committed: None,
        }
    }

    fn end(&self) -> i64 {
        self.base + self.messages.len() as i64
    }
}

#[derive(Default)]
struct LogState {
    partitions: BTreeMap<TopicPartition, PartitionLog>,
    commit_history: Vec<(TopicPartition, i64)>,
    poll_failures: u32,
}

/// A single-consumer log kept in memory.
///
/// Behaves like a broker partition set with manual commits: `poll` advances a
/// read position, `seek` rewinds it, and `commit` only records the resume point.
/// Used by the demo binary and throughout the tests.
#[derive(Default)]
pub struct InMemoryLog {
    state: Mutex<LogState>,
    appended: Notify,
}

impl InMemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a partition whose first offset is `start_offset`. No-op if it exists.
    pub async fn open_partition(&self, topic: &Topic, partition: i32, start_offset: i64) {
        let mut state = self.state.lock().await;
        state
            .partitions
            .entry(TopicPartition::new(topic.clone(), partition))
            .or_insert_with(|| PartitionLog::new(start_offset));
    }

    /// Append a payload; the partition is created at offset 0 if needed.
    pub async fn append(&self, topic: &Topic, partition: i32, payload: Vec<u8>) -> MessageId {
        let id = {
            let mut state = self.state.lock().await;
            let log = state
                .partitions
                .entry(TopicPartition::new(topic.clone(), partition))
                .or_insert_with(|| PartitionLog::new(0));
            let id = MessageId::new(topic.clone(), partition, log.end());
            log.messages
                .push(Message::new(id.clone(), payload).with_timestamp(Utc::now()));
            id
        };
        self.appended.notify_one();
        id
    }

    /// Make the next `count` polls fail.
    pub async fn inject_poll_failure(&self, count: u32) {
        self.state.lock().await.poll_failures = count;
    }

    pub async fn committed(&self, tp: &TopicPartition) -> Option<i64> {
        self.state
            .lock()
            .await
            .partitions
            .get(tp)
            .and_then(|log| log.committed)
    }

    /// Every commit call, in order.
    pub async fn commit_history(&self) -> Vec<(TopicPartition, i64)> {
        self.state.lock().await.commit_history.clone()
    }

    /// True once every appended message has been committed.
    pub async fn is_drained(&self) -> bool {
        self.state
            .lock()
            .await
            .partitions
            .values()
            .all(|log| log.committed.unwrap_or(log.base) >= log.end())
    }

    async fn take_batch(&self, max_messages: usize) -> Result<Vec<Message>, TransportError> {
        let mut state = self.state.lock().await;
        if state.poll_failures > 0 {
            state.poll_failures -= 1;
            return Err(TransportError::Poll("injected poll failure".into()));
        }

        // One message per partition per pass, so a deep backlog in one
        // partition cannot starve the others out of a batch.
        let mut batch = Vec::new();
        while batch.len() < max_messages {
            let before = batch.len();
            for log in state.partitions.values_mut() {
                if batch.len() == max_messages {
                    break;
                }
                if log.position < log.end() {
                    let index = (log.position - log.base) as usize;
                    batch.push(log.messages[index].clone());
                    log.position += 1;
                }
            }
            if batch.len() == before {
                break;
            }
        }
        Ok(batch)
    }
}

#[async_trait]
impl LogConsumer for InMemoryLog {
    async fn poll(
        &self,
        max_messages: usize,
        timeout: Duration,
    ) -> Result<Vec<Message>, TransportError> {
        let deadline = Instant::now() + timeout;
        loop {
            let batch = self.take_batch(max_messages).await?;
            if !batch.is_empty() || Instant::now() >= deadline {
                return Ok(batch);
            }
            // Appends store a permit, so one that races this wait is not lost.
            if tokio::time::timeout_at(deadline, self.appended.notified())
                .await
                .is_err()
            {
                return Ok(Vec::new());
            }
        }
    }

    async fn seek(&self, tp: &TopicPartition, offset: i64) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        let Some(log) = state.partitions.get_mut(tp) else {
            return Err(TransportError::Seek {
                partition: tp.to_string(),
                offset,
                reason: "unknown partition".into(),
            });
        };
        if offset < log.base || offset > log.end() {
            return Err(TransportError::Seek {
                partition: tp.to_string(),
                offset,
                reason: format!("offset outside [{}, {}]", log.base, log.end()),
            });
        }
        log.position = offset;
        Ok(())
    }

    async fn commit(&self, tp: &TopicPartition, next_offset: i64) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        let Some(log) = state.partitions.get_mut(tp) else {
            return Err(TransportError::Commit {
                partition: tp.to_string(),
                offset: next_offset,
                reason: "unknown partition".into(),
            });
        };
        log.committed = Some(next_offset);
        state.commit_history.push((tp.clone(), next_offset));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn poll_respects_batch_size_and_seek_rewinds() {
        let log = InMemoryLog::new();
        let topic = Topic::new("jobs");
        log.open_partition(&topic, 0, 10).await;
        for i in 0..3 {
            log.append(&topic, 0, vec![i]).await;
        }

        let first = log.poll(2, Duration::ZERO).await.unwrap();
        assert_eq!(first.iter().map(Message::offset).collect::<Vec<_>>(), vec![10, 11]);

        let tp = TopicPartition::new(topic.clone(), 0);
        log.seek(&tp, 11).await.unwrap();
        let second = log.poll(10, Duration::ZERO).await.unwrap();
        assert_eq!(second.iter().map(Message::offset).collect::<Vec<_>>(), vec![11, 12]);

        assert!(log.seek(&tp, 99).await.is_err());
        assert!(log.seek(&TopicPartition::new(topic, 5), 0).await.is_err());
    }

    #[tokio::test]
    async fn batch_interleaves_partitions_with_backlog() {
        let log = InMemoryLog::new();
        let topic = Topic::new("jobs");
        for i in 0..5 {
            log.append(&topic, 0, vec![i]).await;
        }
        log.append(&topic, 1, b"p1".to_vec()).await;
        log.append(&topic, 2, b"p2".to_vec()).await;

        let coords = |batch: Vec<Message>| {
            batch
                .iter()
                .map(|m| (m.partition(), m.offset()))
                .collect::<Vec<_>>()
        };

        let first = log.poll(2, Duration::ZERO).await.unwrap();
        assert_eq!(coords(first), vec![(0, 0), (1, 0)]);

        let second = log.poll(10, Duration::ZERO).await.unwrap();
        assert_eq!(coords(second), vec![(0, 1), (2, 0), (0, 2), (0, 3), (0, 4)]);
    }

    #[tokio::test]
    async fn drained_once_everything_is_committed() {
        let log = InMemoryLog::new();
        let topic = Topic::new("jobs");
        let id = log.append(&topic, 0, b"a".to_vec()).await;
        assert!(!log.is_drained().await);

        log.commit(&id.topic_partition(), id.offset + 1).await.unwrap();
        assert!(log.is_drained().await);
        assert_eq!(log.committed(&id.topic_partition()).await, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_poll_waits_for_append_or_timeout() {
        let log = std::sync::Arc::new(InMemoryLog::new());
        let topic = Topic::new("jobs");

        let started = Instant::now();
        let empty = log.poll(10, Duration::from_millis(500)).await.unwrap();
        assert!(empty.is_empty());
        assert!(started.elapsed() >= Duration::from_millis(500));

        let writer = log.clone();
        let t = topic.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            writer.append(&t, 0, b"late".to_vec()).await;
        });
        let batch = log.poll(10, Duration::from_secs(5)).await.unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_poll_errors() {
        let log = InMemoryLog::new();
        log.inject_poll_failure(1).await;
        assert!(matches!(
            log.poll(1, Duration::ZERO).await,
            Err(TransportError::Poll(_))
        ));
        assert!(log.poll(1, Duration::ZERO).await.unwrap().is_empty());
    }
}
