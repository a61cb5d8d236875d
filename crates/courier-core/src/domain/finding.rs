use serde::{Deserialize, Serialize};

/// One piece of sensitive content detected in a document.
///
/// `start` / `end` are character offsets into the analyzed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    pub score: f64,
}

impl Finding {
    pub fn new(entity_type: impl Into<String>, start: usize, end: usize, score: f64) -> Self {
        Self {
            entity_type: entity_type.into(),
            start,
            end,
            score,
        }
    }
}
