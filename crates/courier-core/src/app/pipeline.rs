//! Classification pipeline: the processor the CLI runs behind the delivery loop.
//!
//! fetch content -> decode text -> analyze on the pool -> store results -> DONE.
//! Any failure marks the job ERROR (best effort) and is reported to the loop,
//! which decides whether to retry.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::app::pool::AnalysisPool;
use crate::domain::{Finding, JobRecord, JobStatus};
use crate::error::ProcessingError;
use crate::ports::{ObjectStore, Processor, StatusStore};

pub struct ClassificationPipeline {
    objects: Arc<dyn ObjectStore>,
    pool: AnalysisPool,
    status: Arc<dyn StatusStore>,
}

impl ClassificationPipeline {
    pub fn new(objects: Arc<dyn ObjectStore>, pool: AnalysisPool, status: Arc<dyn StatusStore>) -> Self {
        Self { objects, pool, status }
    }

    async fn classify(&self, job: &JobRecord) -> Result<Vec<Finding>, ProcessingError> {
        let bytes = self.objects.fetch(&job.content_ref).await?;
        let text = String::from_utf8(bytes).map_err(|e| ProcessingError::Decode(e.to_string()))?;

        let findings = self.pool.analyze(text).await?;

        self.status.put_results(&job.job_id, &findings).await?;
        self.status.set_status(&job.job_id, JobStatus::Done, None).await?;
        Ok(findings)
    }
}

#[async_trait]
impl Processor for ClassificationPipeline {
    async fn process(&self, job: &JobRecord) -> Result<Vec<Finding>, ProcessingError> {
        match self.classify(job).await {
            Ok(findings) => {
                debug!(job_id = %job.job_id, findings = findings.len(), "job classified");
                Ok(findings)
            }
            Err(e) => {
                let detail = e.to_string();
                if let Err(status_err) = self
                    .status
                    .set_status(&job.job_id, JobStatus::Error, Some(&detail))
                    .await
                {
                    warn!(job_id = %job.job_id, error = %status_err, "failed to record ERROR status");
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{InMemoryObjectStore, InMemoryStatusStore, PatternAnalyzer};

    fn pipeline(objects: Arc<InMemoryObjectStore>, status: Arc<InMemoryStatusStore>) -> ClassificationPipeline {
        let analyzer = Arc::new(PatternAnalyzer::standard().unwrap());
        ClassificationPipeline::new(objects, AnalysisPool::new(analyzer, 1), status)
    }

    #[tokio::test]
    async fn stores_results_then_marks_done() {
        let objects = Arc::new(InMemoryObjectStore::new());
        objects.put("notes.txt", b"contact alice@example.com today".to_vec()).await;
        let status = Arc::new(InMemoryStatusStore::new());

        let job = JobRecord::new("job-1", "uploads/notes.txt");
        let findings = pipeline(objects, status.clone()).process(&job).await.unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].entity_type, "EMAIL_ADDRESS");
        assert_eq!(status.status("job-1").await, Some((JobStatus::Done, None)));
        assert_eq!(status.results("job-1").await, Some(findings));
    }

    #[tokio::test]
    async fn missing_object_marks_error() {
        let objects = Arc::new(InMemoryObjectStore::new());
        let status = Arc::new(InMemoryStatusStore::new());

        let job = JobRecord::new("job-2", "uploads/gone.txt");
        let err = pipeline(objects, status.clone()).process(&job).await.unwrap_err();

        assert!(matches!(err, ProcessingError::Fetch(_)));
        let (state, detail) = status.status("job-2").await.unwrap();
        assert_eq!(state, JobStatus::Error);
        assert!(detail.unwrap().contains("gone.txt"));
        assert_eq!(status.results("job-2").await, None);
    }

    #[tokio::test]
    async fn binary_content_is_a_decode_failure() {
        let objects = Arc::new(InMemoryObjectStore::new());
        objects.put("blob.bin", vec![0xff, 0xfe, 0x00]).await;
        let status = Arc::new(InMemoryStatusStore::new());

        let err = pipeline(objects, status.clone())
            .process(&JobRecord::new("job-3", "blob.bin"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Decode(_)));
        assert_eq!(status.status("job-3").await.map(|s| s.0), Some(JobStatus::Error));
    }

    #[tokio::test]
    async fn status_outage_fails_the_job() {
        let objects = Arc::new(InMemoryObjectStore::new());
        objects.put("a.txt", b"nothing here".to_vec()).await;
        let status = Arc::new(InMemoryStatusStore::new());
        status.set_unavailable(true);

        let err = pipeline(objects, status.clone())
            .process(&JobRecord::new("job-4", "a.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Status(_)));
        assert_eq!(status.status("job-4").await, None);
    }
}
