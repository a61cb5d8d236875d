//! Processor port - the work done per job.

use async_trait::async_trait;

use crate::domain::{Finding, JobRecord};
use crate::error::ProcessingError;

/// Caller-supplied job handler.
///
/// `Ok` (even with no findings) resolves the message. `Err` is retried with
/// backoff and eventually dead-lettered. Handlers must tolerate seeing the
/// same job more than once.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, job: &JobRecord) -> Result<Vec<Finding>, ProcessingError>;
}
