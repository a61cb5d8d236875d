//! Outcome model: what one delivery attempt produced and where it leaves the message.

use serde::{Deserialize, Serialize};

/// Result of handing one message to the processor.
///
/// A plain value: the loop decides what to do with it (commit, retry, dead-letter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The processor returned findings (possibly none).
    Succeeded { findings: usize },

    /// The processor returned an error or panicked.
    Failed { cause: String },

    /// The payload is not a usable job; retrying cannot help.
    Invalid { reason: String },
}

/// State of a message after the loop handled one delivery of it.
///
/// Transitions per delivery attempt:
/// - Delivered -> Succeeded
/// - Delivered -> TransientFailure (rewound, redelivered later)
/// - Delivered -> Exhausted (dead-lettered, committed)
/// - Delivered -> Skipped (invalid payload, committed)
/// - Delivered -> DeadLetterPending (dead-letter publish failed, rewound)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageState {
    Succeeded,
    TransientFailure,
    Exhausted,
    Skipped,
    DeadLetterPending,
}

impl MessageState {
    /// Terminal states have had their offset committed.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            MessageState::Succeeded | MessageState::Exhausted | MessageState::Skipped
        )
    }
}
