//! Job record carried in a message payload.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::InvalidJob;

const JOB_ID_KEYS: &[&str] = &["job_id", "fileId"];
const CONTENT_REF_KEYS: &[&str] = &["content_ref", "fileLocation"];

/// A file-processing job.
///
/// The upload service publishes `fileId` / `fileLocation`; both those names and
/// `job_id` / `content_ref` are accepted. Any other fields are kept in `extra`
/// and passed through to the processor untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    pub job_id: String,
    pub content_ref: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobRecord {
    pub fn new(job_id: impl Into<String>, content_ref: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            content_ref: content_ref.into(),
            extra: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Decode a payload.
    ///
    /// A job without a non-empty string `job_id` and `content_ref` can never
    /// succeed, so it is reported as [`InvalidJob`] instead of a processing failure.
    pub fn decode(payload: &[u8]) -> Result<Self, InvalidJob> {
        let value: Value =
            serde_json::from_slice(payload).map_err(|e| InvalidJob::Malformed(e.to_string()))?;
        let Value::Object(mut fields) = value else {
            return Err(InvalidJob::NotAnObject);
        };

        let job_id = take_required(&mut fields, JOB_ID_KEYS)?;
        let content_ref = take_required(&mut fields, CONTENT_REF_KEYS)?;

        Ok(Self {
            job_id,
            content_ref,
            extra: fields,
        })
    }

    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

fn take_required(fields: &mut Map<String, Value>, keys: &[&'static str]) -> Result<String, InvalidJob> {
    let canonical = keys[0];
    for key in keys {
        match fields.remove(*key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Ok(s),
            Some(_) => return Err(InvalidJob::MissingField(canonical)),
            None => continue,
        }
    }
    Err(InvalidJob::MissingField(canonical))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn decodes_canonical_fields_and_keeps_extras() {
        let payload = json!({
            "job_id": "job-1",
            "content_ref": "uploads/report.csv",
            "uploadedBy": "alice",
        });
        let job = JobRecord::decode(payload.to_string().as_bytes()).unwrap();

        assert_eq!(job.job_id, "job-1");
        assert_eq!(job.content_ref, "uploads/report.csv");
        assert_eq!(job.extra.get("uploadedBy"), Some(&json!("alice")));
    }

    #[test]
    fn decodes_upload_service_field_names() {
        let payload = json!({ "fileId": "f-9", "fileLocation": "uploads/a.txt" });
        let job = JobRecord::decode(payload.to_string().as_bytes()).unwrap();

        assert_eq!(job.job_id, "f-9");
        assert_eq!(job.content_ref, "uploads/a.txt");
        assert!(job.extra.is_empty());
    }

    #[rstest]
    #[case::missing_job_id(json!({ "content_ref": "a.txt" }), "job_id")]
    #[case::empty_job_id(json!({ "job_id": "  ", "content_ref": "a.txt" }), "job_id")]
    #[case::numeric_content_ref(json!({ "job_id": "j", "content_ref": 7 }), "content_ref")]
    #[case::missing_content_ref(json!({ "fileId": "j" }), "content_ref")]
    fn rejects_missing_required_fields(#[case] payload: Value, #[case] field: &str) {
        let err = JobRecord::decode(payload.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, InvalidJob::MissingField(f) if f == field));
    }

    #[test]
    fn rejects_non_object_and_garbage_payloads() {
        assert!(matches!(
            JobRecord::decode(b"[1,2,3]"),
            Err(InvalidJob::NotAnObject)
        ));
        assert!(matches!(
            JobRecord::decode(b"\xff not json"),
            Err(InvalidJob::Malformed(_))
        ));
    }

    #[test]
    fn payload_flattens_extras() {
        let job = JobRecord::new("j", "uploads/x.txt").with_field("size", json!(12));
        let value: Value = serde_json::from_slice(&job.to_payload().unwrap()).unwrap();
        assert_eq!(value, json!({ "job_id": "j", "content_ref": "uploads/x.txt", "size": 12 }));
    }
}
