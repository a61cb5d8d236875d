//! Ports - the engine's boundary
//!
//! Each trait is a capability handed to the engine or the pipeline. The delivery
//! loop only ever sees [`LogConsumer`], [`DeadLetterSink`] and [`Processor`];
//! the stores and the analyzer are private to the classification pipeline.

pub mod analyzer;
pub mod clock;
pub mod dead_letter_sink;
pub mod id_generator;
pub mod log_consumer;
pub mod object_store;
pub mod processor;
pub mod status_store;

pub use self::analyzer::Analyzer;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::dead_letter_sink::DeadLetterSink;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::log_consumer::LogConsumer;
pub use self::object_store::{ObjectStore, object_key};
pub use self::processor::Processor;
pub use self::status_store::StatusStore;
