//! Domain model (coordinates, jobs, findings, dead letters, outcomes).

pub mod dead_letter;
pub mod finding;
pub mod ids;
pub mod job;
pub mod message;
pub mod outcome;
pub mod status;

pub use dead_letter::{DeadLetterRecord, SourceCoordinates};
pub use finding::Finding;
pub use ids::{DeadLetterId, Id, IdMarker, MessageId, Topic, TopicPartition};
pub use job::JobRecord;
pub use message::Message;
pub use outcome::{Delivery, MessageState};
pub use status::JobStatus;
