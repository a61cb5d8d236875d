//! Impls - port implementations
//!
//! # In-memory / local (always built)
//! - **InMemoryLog**: partitioned log with manual commits (demo and tests)
//! - **InMemoryDeadLetterSink**: dead-letter channel with failure injection
//! - **InMemoryStatusStore** / **InMemoryObjectStore**
//! - **LocalObjectStore**: uploaded files in a local directory
//! - **PatternAnalyzer**: regex PII analyzer
//!
//! # Broker (feature `kafka`)
//! - **KafkaLogConsumer** / **KafkaDeadLetterSink**

#[cfg(feature = "kafka")]
pub mod kafka;
pub mod local_objects;
pub mod memory_dead_letter;
pub mod memory_log;
pub mod memory_stores;
pub mod pattern_analyzer;

pub use self::local_objects::LocalObjectStore;
pub use self::memory_dead_letter::InMemoryDeadLetterSink;
pub use self::memory_log::InMemoryLog;
pub use self::memory_stores::{InMemoryObjectStore, InMemoryStatusStore};
pub use self::pattern_analyzer::PatternAnalyzer;
