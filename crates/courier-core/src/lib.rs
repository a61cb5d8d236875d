//! courier-core
//!
//! At-least-once delivery engine for file-classification jobs read from a
//! partitioned, offset-addressed log.
//!
//! # Modules
//! - **domain**: message coordinates, job records, findings, dead-letter records, outcomes
//! - **ports**: traits at the system boundary (LogConsumer, DeadLetterSink, Processor, stores, Clock)
//! - **app**: the delivery engine (backoff, retry ledger, commit discipline, dead-letter
//!   router, delivery loop) and the classification pipeline that drives the analyzer
//! - **impls**: in-memory and local adapters, plus rdkafka adapters behind the `kafka` feature
//! - **config**: environment-driven settings
//! - **observability**: delivery counters

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;

pub use app::{DeliveryLoop, EngineBuilder, EngineConfig};
pub use error::{BuildError, EngineError};
