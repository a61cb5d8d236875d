//! Delivery loop: poll, process, then commit, retry or dead-letter.
//!
//! One loop owns one consumer and handles messages strictly one at a time.
//!
//! # Stalled partitions
//!
//! A partition whose message is waiting for a retry is "stalled" for the rest
//! of the batch: its later messages are dropped from the batch and come back
//! after the rewind, so offsets never reach the processor out of order and
//! commits never pass an unresolved message. Other partitions in the same
//! batch keep flowing.
//!
//! # Retrying by rewinding
//!
//! The loop never holds a failed message in memory for a later attempt.
//! It sleeps for the backoff delay, seeks the partition back to the failed
//! offset and lets the next poll hand the message over again. The only state
//! carried across polls is the [`RetryLedger`] (failure counts) and the
//! dead-letter records whose publish has not gone through yet.
//!
//! # Dead letters
//!
//! On failure number `max_retries + 1` a [`DeadLetterRecord`] is built and
//! published. If the publish fails, that record is kept and the message is
//! rewound like any transient failure; on redelivery the same record is
//! offered again instead of running the processor. The offset is committed
//! only after the channel accepts it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::app::backoff::BackoffPolicy;
use crate::app::commit::CommitDiscipline;
use crate::app::dead_letter::DeadLetterRouter;
use crate::app::ledger::RetryLedger;
use crate::app::shutdown::{RunningEngine, ShutdownHandle, ShutdownSignal};
use crate::domain::{DeadLetterRecord, Delivery, JobRecord, Message, MessageId, MessageState, TopicPartition};
use crate::error::{EngineError, Undelivered};
use crate::observability::{BatchReport, DeliveryCounts};
use crate::ports::{LogConsumer, Processor};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Retries after the first failed attempt; the message is dead-lettered on
    /// failure number `max_retries + 1`.
    pub max_retries: u32,
    pub backoff: BackoffPolicy,
    pub batch_size: usize,
    pub poll_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: BackoffPolicy::default(),
            batch_size: 100,
            poll_timeout: Duration::from_secs(1),
        }
    }
}

pub struct DeliveryLoop {
    consumer: Arc<dyn LogConsumer>,
    processor: Arc<dyn Processor>,
    router: DeadLetterRouter,
    commits: CommitDiscipline,
    ledger: RetryLedger,
    config: EngineConfig,
    /// Exhausted messages whose dead-letter publish failed, with the record
    /// to offer again.
    pending_dead_letters: HashMap<MessageId, DeadLetterRecord>,
    counts: DeliveryCounts,
    shutdown: ShutdownSignal,
    shutdown_handle: ShutdownHandle,
}

impl DeliveryLoop {
    pub(crate) fn new(
        consumer: Arc<dyn LogConsumer>,
        processor: Arc<dyn Processor>,
        router: DeadLetterRouter,
        config: EngineConfig,
        shutdown_handle: ShutdownHandle,
    ) -> Self {
        Self {
            commits: CommitDiscipline::new(Arc::clone(&consumer)),
            consumer,
            processor,
            router,
            ledger: RetryLedger::new(),
            config,
            pending_dead_letters: HashMap::new(),
            counts: DeliveryCounts::default(),
            shutdown: shutdown_handle.signal(),
            shutdown_handle,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn counts(&self) -> DeliveryCounts {
        self.counts
    }

    pub fn ledger(&self) -> &RetryLedger {
        &self.ledger
    }

    pub fn committed(&self, tp: &TopicPartition) -> Option<i64> {
        self.commits.committed(tp)
    }

    pub fn pending_dead_letters(&self) -> usize {
        self.pending_dead_letters.len()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown_handle.clone()
    }

    /// Run until shutdown is requested or the transport fails.
    pub async fn run(&mut self) -> Result<DeliveryCounts, EngineError> {
        info!(
            max_retries = self.config.max_retries,
            batch_size = self.config.batch_size,
            "delivery loop started"
        );

        while !self.shutdown.is_triggered() {
            if let Err(e) = self.poll_once().await {
                error!(error = %e, "delivery loop stopped by transport failure");
                return Err(e);
            }
        }

        info!(
            succeeded = self.counts.succeeded,
            retried = self.counts.retried,
            dead_lettered = self.counts.dead_lettered,
            skipped = self.counts.skipped,
            "delivery loop stopped"
        );
        Ok(self.counts)
    }

    /// Move the loop onto its own task.
    pub fn spawn(mut self) -> RunningEngine {
        let handle = self.shutdown_handle.clone();
        let join = tokio::spawn(async move { self.run().await });
        RunningEngine::new(handle, join)
    }

    /// Poll one batch and handle every message in it.
    pub async fn poll_once(&mut self) -> Result<BatchReport, EngineError> {
        if self.shutdown.is_triggered() {
            return Ok(BatchReport::default());
        }

        let consumer = Arc::clone(&self.consumer);
        let batch = tokio::select! {
            biased;
            _ = self.shutdown.triggered() => return Ok(BatchReport::default()),
            polled = consumer.poll(self.config.batch_size, self.config.poll_timeout) => polled?,
        };

        let mut report = BatchReport {
            polled: batch.len(),
            ..BatchReport::default()
        };
        let mut stalled: HashSet<TopicPartition> = HashSet::new();

        for message in &batch {
            let tp = message.topic_partition();
            if stalled.contains(&tp) {
                report.deferred += 1;
                continue;
            }

            if self.shutdown.is_triggered() {
                // Unhandled messages stay uncommitted; rewind so they are read again.
                self.consumer.seek(&tp, message.offset()).await?;
                stalled.insert(tp);
                report.deferred += 1;
                continue;
            }

            let state = self.handle(message).await?;
            self.counts.record(state);
            report.outcomes.push((message.id().clone(), state));
            if !state.is_terminal() {
                stalled.insert(tp);
            }
        }

        Ok(report)
    }

    /// Decode the payload and run the processor once.
    ///
    /// Never fails: the result is a value for the loop to interpret. A panic
    /// inside the processor is reported as [`Delivery::Failed`].
    pub async fn deliver(&self, message: &Message) -> Delivery {
        let job = match JobRecord::decode(message.payload()) {
            Ok(job) => job,
            Err(e) => {
                return Delivery::Invalid {
                    reason: e.to_string(),
                };
            }
        };

        let processor = Arc::clone(&self.processor);
        let task = tokio::spawn(async move { processor.process(&job).await });

        match task.await {
            Ok(Ok(findings)) => Delivery::Succeeded {
                findings: findings.len(),
            },
            Ok(Err(e)) => Delivery::Failed {
                cause: e.to_string(),
            },
            Err(join) if join.is_panic() => Delivery::Failed {
                cause: format!("processor panicked: {}", panic_message(join.into_panic())),
            },
            Err(join) => Delivery::Failed {
                cause: join.to_string(),
            },
        }
    }

    async fn handle(&mut self, message: &Message) -> Result<MessageState, EngineError> {
        let id = message.id();

        // The processor already gave up on this one; only the publish is retried.
        if let Some(record) = self.pending_dead_letters.remove(id) {
            debug!(%id, dead_letter_id = %record.id, "retrying dead-letter publish");
            let published = self.router.publish(record).await;
            return self.settle_dead_letter(message, published).await;
        }

        match self.deliver(message).await {
            Delivery::Succeeded { findings } => {
                self.ledger.clear(id);
                self.commits.resolve(message).await?;
                debug!(%id, findings, "message processed");
                Ok(MessageState::Succeeded)
            }
            Delivery::Invalid { reason } => {
                warn!(
                    topic = %message.topic(),
                    partition = message.partition(),
                    offset = message.offset(),
                    reason = %reason,
                    "skipping invalid message"
                );
                self.ledger.clear(id);
                self.commits.resolve(message).await?;
                Ok(MessageState::Skipped)
            }
            Delivery::Failed { cause } => self.on_failure(message, cause).await,
        }
    }

    async fn on_failure(&mut self, message: &Message, cause: String) -> Result<MessageState, EngineError> {
        let id = message.id();
        let attempt = self.ledger.record_failure(id);

        // Failure number `attempt` schedules retry number `attempt`; the first
        // retry uses `delay(0)`.
        if attempt <= self.config.max_retries {
            let wait = self.config.backoff.delay(attempt - 1);
            warn!(
                topic = %message.topic(),
                partition = message.partition(),
                offset = message.offset(),
                attempt,
                max_retries = self.config.max_retries,
                delay_ms = millis(wait),
                cause = %cause,
                "processing failed, will retry"
            );
            self.pause(wait).await;
            self.consumer.seek(&message.topic_partition(), message.offset()).await?;
            return Ok(MessageState::TransientFailure);
        }

        error!(
            topic = %message.topic(),
            partition = message.partition(),
            offset = message.offset(),
            attempt,
            cause = %cause,
            "retries exhausted"
        );
        let routed = self.router.route(message, &cause, attempt).await;
        self.settle_dead_letter(message, routed).await
    }

    /// Commit after an accepted dead letter; otherwise keep the record and rewind.
    async fn settle_dead_letter(
        &mut self,
        message: &Message,
        published: Result<DeadLetterRecord, Undelivered>,
    ) -> Result<MessageState, EngineError> {
        let id = message.id();

        match published {
            Ok(_) => {
                self.ledger.clear(id);
                self.commits.resolve(message).await?;
                Ok(MessageState::Exhausted)
            }
            Err(Undelivered { record, source }) => {
                error!(
                    topic = %message.topic(),
                    partition = message.partition(),
                    offset = message.offset(),
                    dead_letter_id = %record.id,
                    error = %source,
                    "dead-letter publish failed, message left uncommitted"
                );
                self.pending_dead_letters.insert(id.clone(), *record);
                // Publish retries wait as long as the next retry would have.
                let wait = self.config.backoff.delay(self.config.max_retries);
                self.pause(wait).await;
                self.consumer.seek(&message.topic_partition(), message.offset()).await?;
                Ok(MessageState::DeadLetterPending)
            }
        }
    }

    /// Sleep, returning early on shutdown.
    async fn pause(&mut self, wait: Duration) {
        if wait.is_zero() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = self.shutdown.triggered() => {
                debug!("backoff interrupted by shutdown");
            }
        }
    }
}

/// Whole milliseconds for log fields, saturating for delays past `u64::MAX` ms.
fn millis(wait: Duration) -> u64 {
    u64::try_from(wait.as_millis()).unwrap_or(u64::MAX)
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::zero(Duration::ZERO, 0)]
    #[case::sub_millisecond(Duration::from_micros(999), 0)]
    #[case::seconds(Duration::from_secs(5), 5_000)]
    #[case::saturated_backoff(Duration::MAX, u64::MAX)]
    fn log_delay_saturates_instead_of_truncating(#[case] wait: Duration, #[case] expected: u64) {
        assert_eq!(millis(wait), expected);
    }

    #[test]
    fn panic_payloads_become_causes() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(7_u8)), "non-string panic payload");
    }
}
