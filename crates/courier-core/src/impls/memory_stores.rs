//! In-memory status and object stores.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Finding, JobStatus};
use crate::error::{ObjectStoreError, StatusStoreError};
use crate::ports::{ObjectStore, StatusStore, object_key};

#[derive(Debug, Clone, PartialEq)]
struct JobEntry {
    status: Option<(JobStatus, Option<String>)>,
    results: Option<Vec<Finding>>,
}

#[derive(Default)]
pub struct InMemoryStatusStore {
    jobs: Mutex<HashMap<String, JobEntry>>,
    unavailable: AtomicBool,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every write fails with [`StatusStoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn status(&self, job_id: &str) -> Option<(JobStatus, Option<String>)> {
        self.jobs.lock().await.get(job_id).and_then(|e| e.status.clone())
    }

    pub async fn results(&self, job_id: &str) -> Option<Vec<Finding>> {
        self.jobs.lock().await.get(job_id).and_then(|e| e.results.clone())
    }

    fn check_available(&self) -> Result<(), StatusStoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StatusStoreError::Unavailable("store marked unavailable".into()));
        }
        Ok(())
    }

    async fn upsert(&self, job_id: &str, apply: impl FnOnce(&mut JobEntry)) {
        let mut jobs = self.jobs.lock().await;
        let entry = jobs.entry(job_id.to_string()).or_insert(JobEntry {
            status: None,
            results: None,
        });
        apply(entry);
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn set_status(
        &self,
        job_id: &str,
        status: JobStatus,
        error_detail: Option<&str>,
    ) -> Result<(), StatusStoreError> {
        self.check_available()?;
        let detail = error_detail.map(str::to_string);
        self.upsert(job_id, |e| e.status = Some((status, detail))).await;
        Ok(())
    }

    async fn put_results(&self, job_id: &str, findings: &[Finding]) -> Result<(), StatusStoreError> {
        self.check_available()?;
        let findings = findings.to_vec();
        self.upsert(job_id, |e| e.results = Some(findings)).await;
        Ok(())
    }
}

/// Objects keyed by name; references resolve through [`object_key`].
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, key: impl Into<String>, bytes: Vec<u8>) {
        self.objects.lock().await.insert(key.into(), bytes);
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn fetch(&self, content_ref: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let key = object_key(content_ref)
            .ok_or_else(|| ObjectStoreError::InvalidReference(content_ref.to_string()))?;
        self.objects
            .lock()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| ObjectStoreError::NotFound(content_ref.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn status_writes_are_upserts() {
        let store = InMemoryStatusStore::new();
        store.set_status("j", JobStatus::Error, Some("boom")).await.unwrap();
        store.put_results("j", &[Finding::new("EMAIL_ADDRESS", 0, 5, 1.0)]).await.unwrap();
        store.set_status("j", JobStatus::Done, None).await.unwrap();

        assert_eq!(store.status("j").await, Some((JobStatus::Done, None)));
        assert_eq!(store.results("j").await.map(|r| r.len()), Some(1));
        assert_eq!(store.status("other").await, None);
    }

    #[tokio::test]
    async fn objects_resolve_by_last_segment() {
        let store = InMemoryObjectStore::new();
        store.put("a.txt", b"hi".to_vec()).await;

        assert_eq!(store.fetch("uploads/a.txt").await.unwrap(), b"hi");
        assert!(matches!(store.fetch("uploads/b.txt").await, Err(ObjectStoreError::NotFound(_))));
        assert!(matches!(store.fetch("uploads/").await, Err(ObjectStoreError::InvalidReference(_))));
    }
}
