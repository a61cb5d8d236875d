use std::io;

use thiserror::Error;

use crate::domain::{DeadLetterRecord, Topic};

/// Failure of the log client itself (poll, seek, commit).
///
/// The loop cannot make progress without its transport, so these are fatal and
/// surface as [`EngineError::Transport`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("poll failed: {0}")]
    Poll(String),

    #[error("seek to {partition}@{offset} failed: {reason}")]
    Seek {
        partition: String,
        offset: i64,
        reason: String,
    },

    #[error("commit of {partition}@{offset} failed: {reason}")]
    Commit {
        partition: String,
        offset: i64,
        reason: String,
    },
}

/// The dead-letter channel did not accept a record.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to serialize dead-letter record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("publish to {topic} rejected: {reason}")]
    Rejected { topic: Topic, reason: String },
}

/// A dead-letter record the channel did not accept, handed back so the same
/// record can be offered again.
#[derive(Debug, Error)]
#[error("dead letter {} not delivered: {source}", .record.id)]
pub struct Undelivered {
    pub record: Box<DeadLetterRecord>,
    #[source]
    pub source: PublishError,
}

/// Why a job could not be processed this time. Always retryable from the
/// loop's point of view.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Fetch(#[from] ObjectStoreError),

    #[error("content is not valid UTF-8 text: {0}")]
    Decode(String),

    #[error("analysis failed: {0}")]
    Analysis(String),

    #[error(transparent)]
    Status(#[from] StatusStoreError),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid content reference: {0:?}")]
    InvalidReference(String),

    #[error("failed to read {content_ref}: {source}")]
    Io {
        content_ref: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum StatusStoreError {
    #[error("status store unavailable: {0}")]
    Unavailable(String),
}

/// Payload that can never become a job. Terminal: skipped and committed.
#[derive(Debug, Error)]
pub enum InvalidJob {
    #[error("payload is not valid JSON: {0}")]
    Malformed(String),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("missing or empty field `{0}`")]
    MissingField(&'static str),
}

/// Errors that stop the delivery loop.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("engine task aborted: {0}")]
    Aborted(String),
}

/// Errors raised while wiring an engine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("missing components: {0:?}")]
    MissingComponents(Vec<&'static str>),

    #[error("invalid engine config: {0}")]
    InvalidConfig(String),
}
