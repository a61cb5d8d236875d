//! EngineBuilder - wiring for a delivery loop
//!
//! Fail-fast: `build()` reports every missing component at once and rejects
//! configs the loop cannot run with.

use std::sync::Arc;

use crate::app::dead_letter::DeadLetterRouter;
use crate::app::delivery_loop::{DeliveryLoop, EngineConfig};
use crate::app::shutdown::ShutdownHandle;
use crate::error::BuildError;
use crate::ports::{Clock, DeadLetterSink, IdGenerator, LogConsumer, Processor, SystemClock, UlidGenerator};

/// # Example
/// ```ignore
/// let engine = EngineBuilder::new()
///     .consumer(log)
///     .processor(pipeline)
///     .dead_letters(sink)
///     .config(EngineConfig::default())
///     .build()?;
/// ```
#[derive(Default)]
pub struct EngineBuilder {
    consumer: Option<Arc<dyn LogConsumer>>,
    processor: Option<Arc<dyn Processor>>,
    dead_letters: Option<Arc<dyn DeadLetterSink>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    shutdown: Option<ShutdownHandle>,
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consumer(mut self, consumer: Arc<dyn LogConsumer>) -> Self {
        self.consumer = Some(consumer);
        self
    }

    pub fn processor(mut self, processor: Arc<dyn Processor>) -> Self {
        self.processor = Some(processor);
        self
    }

    pub fn dead_letters(mut self, sink: Arc<dyn DeadLetterSink>) -> Self {
        self.dead_letters = Some(sink);
        self
    }

    /// Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Defaults to a [`UlidGenerator`] on the engine clock.
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Share an existing shutdown handle (e.g. one already wired to Ctrl-C).
    pub fn shutdown(mut self, handle: ShutdownHandle) -> Self {
        self.shutdown = Some(handle);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<DeliveryLoop, BuildError> {
        let mut missing = Vec::new();
        if self.consumer.is_none() {
            missing.push("consumer");
        }
        if self.processor.is_none() {
            missing.push("processor");
        }
        if self.dead_letters.is_none() {
            missing.push("dead_letters");
        }

        let (Some(consumer), Some(processor), Some(dead_letters)) =
            (self.consumer, self.processor, self.dead_letters)
        else {
            return Err(BuildError::MissingComponents(missing));
        };

        if self.config.batch_size == 0 {
            return Err(BuildError::InvalidConfig("batch_size must be at least 1".into()));
        }

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(Arc::clone(&clock))));
        let router = DeadLetterRouter::new(dead_letters, clock, ids);

        Ok(DeliveryLoop::new(
            consumer,
            processor,
            router,
            self.config,
            self.shutdown.unwrap_or_default(),
        ))
    }
}
