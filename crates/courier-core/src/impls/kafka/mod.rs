//! Kafka adapters (feature `kafka`).
//!
//! - [`KafkaLogConsumer`]: `StreamConsumer` with auto-commit off; commits are
//!   explicit and synchronous
//! - [`KafkaDeadLetterSink`]: `FutureProducer` publishing JSON dead-letter records

mod config;
mod consumer;
mod dead_letter;

pub use self::config::client_config;
pub use self::consumer::KafkaLogConsumer;
pub use self::dead_letter::KafkaDeadLetterSink;
