//! Shared fixtures for the engine integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use courier_core::app::{BackoffPolicy, DeliveryLoop, EngineBuilder, EngineConfig};
use courier_core::domain::{Finding, JobRecord, Topic, TopicPartition};
use courier_core::error::{EngineError, ProcessingError};
use courier_core::impls::{InMemoryDeadLetterSink, InMemoryLog};
use courier_core::observability::DeliveryCounts;
use courier_core::ports::Processor;
use serde_json::json;
use tokio::sync::Notify;
use tokio::time::Instant;

pub const TOPIC: &str = "file-uploads";

pub fn topic() -> Topic {
    Topic::new(TOPIC)
}

pub fn tp(partition: i32) -> TopicPartition {
    TopicPartition::new(TOPIC, partition)
}

pub fn job_payload(job_id: &str) -> Vec<u8> {
    json!({ "job_id": job_id, "content_ref": format!("uploads/{job_id}.txt") })
        .to_string()
        .into_bytes()
}

/// What the processor does on one call for a given job.
#[derive(Debug, Clone)]
pub enum Step {
    Succeed(usize),
    Fail(&'static str),
    Panic,
    /// Signal `started`, then wait for `release` before succeeding.
    Gate,
}

/// Processor driven by per-job scripts; records every call with its time.
#[derive(Default)]
pub struct ScriptedProcessor {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    always: Mutex<HashMap<String, Step>>,
    calls: Mutex<Vec<(String, Instant)>>,
    pub started: Notify,
    pub release: Notify,
}

impl ScriptedProcessor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Steps for the next calls of `job_id`; later calls succeed.
    pub fn script(&self, job_id: &str, steps: impl IntoIterator<Item = Step>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(job_id.to_string(), steps.into_iter().collect());
    }

    /// Same step on every call of `job_id`.
    pub fn always(&self, job_id: &str, step: Step) {
        self.always.lock().unwrap().insert(job_id.to_string(), step);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn call_times(&self, job_id: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == job_id)
            .map(|(_, at)| *at)
            .collect()
    }

    fn next_step(&self, job_id: &str) -> Step {
        if let Some(step) = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(job_id)
            .and_then(VecDeque::pop_front)
        {
            return step;
        }
        self.always
            .lock()
            .unwrap()
            .get(job_id)
            .cloned()
            .unwrap_or(Step::Succeed(0))
    }
}

#[async_trait]
impl Processor for ScriptedProcessor {
    async fn process(&self, job: &JobRecord) -> Result<Vec<Finding>, ProcessingError> {
        self.calls
            .lock()
            .unwrap()
            .push((job.job_id.clone(), Instant::now()));

        match self.next_step(&job.job_id) {
            Step::Succeed(n) => Ok((0..n).map(|i| Finding::new("EMAIL_ADDRESS", i, i + 1, 1.0)).collect()),
            Step::Fail(cause) => Err(ProcessingError::Other(cause.to_string())),
            Step::Panic => panic!("scripted panic for {}", job.job_id),
            Step::Gate => {
                self.started.notify_one();
                self.release.notified().await;
                Ok(Vec::new())
            }
        }
    }
}

pub fn config(max_retries: u32, backoff_base: Duration) -> EngineConfig {
    EngineConfig {
        max_retries,
        backoff: BackoffPolicy::linear(backoff_base),
        batch_size: 100,
        poll_timeout: Duration::from_millis(100),
    }
}

pub fn engine(
    log: &Arc<InMemoryLog>,
    processor: Arc<dyn Processor>,
    sink: &Arc<InMemoryDeadLetterSink>,
    config: EngineConfig,
) -> DeliveryLoop {
    EngineBuilder::new()
        .consumer(log.clone())
        .processor(processor)
        .dead_letters(sink.clone())
        .config(config)
        .build()
        .expect("engine wiring")
}

/// Poll until a poll comes back empty.
pub async fn drain(engine: &mut DeliveryLoop) -> Result<DeliveryCounts, EngineError> {
    loop {
        let report = engine.poll_once().await?;
        if report.is_idle() {
            return Ok(engine.counts());
        }
    }
}
