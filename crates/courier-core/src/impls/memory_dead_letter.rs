use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{DeadLetterRecord, Topic};
use crate::error::PublishError;
use crate::ports::DeadLetterSink;

/// Dead-letter channel kept in memory, with failure injection for tests.
#[derive(Default)]
pub struct InMemoryDeadLetterSink {
    records: Mutex<Vec<(Topic, DeadLetterRecord)>>,
    attempted: Mutex<Vec<DeadLetterRecord>>,
    failures_left: AtomicU32,
    attempts: AtomicU32,
}

impl InMemoryDeadLetterSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` publishes.
    pub fn fail_next(&self, count: u32) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Publish calls so far, including rejected ones.
    pub fn publish_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Every record offered to the sink, in order, including rejected ones.
    pub async fn attempted(&self) -> Vec<DeadLetterRecord> {
        self.attempted.lock().await.clone()
    }

    /// Records the sink accepted.
    pub async fn records(&self) -> Vec<(Topic, DeadLetterRecord)> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl DeadLetterSink for InMemoryDeadLetterSink {
    async fn publish(&self, topic: &Topic, record: &DeadLetterRecord) -> Result<(), PublishError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.attempted.lock().await.push(record.clone());

        let rejected = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejected {
            return Err(PublishError::Rejected {
                topic: topic.clone(),
                reason: "injected publish failure".into(),
            });
        }

        self.records.lock().await.push((topic.clone(), record.clone()));
        Ok(())
    }
}
