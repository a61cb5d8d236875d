use serde::{Deserialize, Serialize};

use crate::domain::{MessageId, MessageState};

/// Outcome counters for one engine instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCounts {
    pub succeeded: u64,
    pub retried: u64,
    pub dead_lettered: u64,
    pub skipped: u64,
    pub publish_failures: u64,
}

impl DeliveryCounts {
    pub fn record(&mut self, state: MessageState) {
        let slot = match state {
            MessageState::Succeeded => &mut self.succeeded,
            MessageState::TransientFailure => &mut self.retried,
            MessageState::Exhausted => &mut self.dead_lettered,
            MessageState::Skipped => &mut self.skipped,
            MessageState::DeadLetterPending => &mut self.publish_failures,
        };
        *slot += 1;
    }

    /// Messages whose offset was committed.
    pub fn resolved(&self) -> u64 {
        self.succeeded + self.dead_lettered + self.skipped
    }
}

/// What one `poll_once` did.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub polled: usize,
    /// Messages not handed to the processor: their partition stalled on an
    /// earlier message of the batch, or shutdown was requested.
    pub deferred: usize,
    pub outcomes: Vec<(MessageId, MessageState)>,
}

impl BatchReport {
    pub fn is_idle(&self) -> bool {
        self.polled == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_state_lands_in_its_own_counter() {
        let mut a = DeliveryCounts::default();
        a.record(MessageState::Succeeded);
        a.record(MessageState::TransientFailure);
        a.record(MessageState::Exhausted);
        a.record(MessageState::Skipped);
        a.record(MessageState::DeadLetterPending);

        assert_eq!(
            a,
            DeliveryCounts {
                succeeded: 1,
                retried: 1,
                dead_lettered: 1,
                skipped: 1,
                publish_failures: 1,
            }
        );
        assert_eq!(a.resolved(), 3);
    }
}
