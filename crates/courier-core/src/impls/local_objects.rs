use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::ObjectStoreError;
use crate::ports::{ObjectStore, object_key};

/// Object store backed by one directory (the upload service's upload dir).
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn fetch(&self, content_ref: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let key = object_key(content_ref)
            .ok_or_else(|| ObjectStoreError::InvalidReference(content_ref.to_string()))?;

        match tokio::fs::read(self.root.join(key)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ObjectStoreError::NotFound(content_ref.to_string()))
            }
            Err(source) => Err(ObjectStoreError::Io {
                content_ref: content_ref.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_by_key_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("report.txt"), b"data").unwrap();
        let store = LocalObjectStore::new(dir.path());

        assert_eq!(store.fetch("whatever/prefix/report.txt").await.unwrap(), b"data");
        assert!(matches!(
            store.fetch("missing.txt").await,
            Err(ObjectStoreError::NotFound(_))
        ));
        assert!(matches!(
            store.fetch("../..").await,
            Err(ObjectStoreError::InvalidReference(_))
        ));
    }
}
