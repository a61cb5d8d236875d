use async_trait::async_trait;

use crate::domain::{Finding, JobStatus};
use crate::error::StatusStoreError;

/// Job inventory: status and analysis results per job.
///
/// Writes are upserts keyed by `job_id`, so a redelivered job overwrites its
/// earlier results.
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn set_status(
        &self,
        job_id: &str,
        status: JobStatus,
        error_detail: Option<&str>,
    ) -> Result<(), StatusStoreError>;

    async fn put_results(&self, job_id: &str, findings: &[Finding]) -> Result<(), StatusStoreError>;
}
