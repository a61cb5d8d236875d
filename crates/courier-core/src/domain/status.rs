//! Job status as stored in the file inventory.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of an uploaded file.
///
/// Serialized with the wire values the upload service already stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    #[serde(rename = "REQ")]
    Requested,
    #[serde(rename = "UPLOADED")]
    Uploaded,
    #[serde(rename = "DONE")]
    Done,
    #[serde(rename = "ERROR")]
    Error,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Requested => "REQ",
            JobStatus::Uploaded => "UPLOADED",
            JobStatus::Done => "DONE",
            JobStatus::Error => "ERROR",
        }
    }

    /// No further status change is expected from the classifier.
    pub fn is_final(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_inventory_values() {
        assert_eq!(serde_json::to_string(&JobStatus::Requested).unwrap(), "\"REQ\"");
        assert_eq!(serde_json::to_string(&JobStatus::Done).unwrap(), "\"DONE\"");

        let back: JobStatus = serde_json::from_str("\"ERROR\"").unwrap();
        assert_eq!(back, JobStatus::Error);
        assert!(back.is_final());
        assert!(!JobStatus::Uploaded.is_final());
    }
}
