//! ObjectStore port - uploaded file contents.

use async_trait::async_trait;

use crate::error::ObjectStoreError;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn fetch(&self, content_ref: &str) -> Result<Vec<u8>, ObjectStoreError>;
}

/// Object key for a content reference: its last `/`-separated segment.
///
/// Returns `None` for references that do not name an object (`""`, `"dir/"`,
/// `"."`, `".."`).
pub fn object_key(content_ref: &str) -> Option<&str> {
    let key = content_ref.rsplit('/').next()?;
    match key {
        "" | "." | ".." => None,
        key => Some(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("report.csv", Some("report.csv"))]
    #[case("uploads/2025/report.csv", Some("report.csv"))]
    #[case("/abs/path/a.txt", Some("a.txt"))]
    #[case("uploads/", None)]
    #[case("", None)]
    #[case("uploads/..", None)]
    #[case(".", None)]
    fn key_is_last_segment(#[case] content_ref: &str, #[case] expected: Option<&str>) {
        assert_eq!(object_key(content_ref), expected);
    }
}
