//! Identifiers: log coordinates and generated record ids.
//!
//! A message is identified by where it sits in the log, `(topic, partition, offset)`.
//! Records the engine creates itself (dead letters) get a ULID wrapped in a
//! typed `Id<T>` so ids of different kinds cannot be mixed up.
//!
//! # Phantom-typed ids
//!
//! `Id<T>` stores only a [`Ulid`]; the marker `T` exists at the type level and
//! supplies the string prefix (`dlq-...`). The prefix is written on serialize
//! and required on deserialize, so an id pasted from the wrong channel is
//! rejected at the boundary instead of silently matching nothing.
//!
//! # Ordering
//!
//! ULIDs sort by creation time, so dead-letter ids listed in order read as a
//! timeline even across engine restarts.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ulid::Ulid;

/// Name of a channel on the log.
///
/// Cloning shares the underlying string, so building a [`MessageId`] per
/// delivery never allocates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Topic(Arc<str>);

impl Topic {
    /// Suffix appended to a source topic to name its dead-letter channel.
    pub const DEAD_LETTER_SUFFIX: &'static str = ".dlq";

    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The sibling dead-letter channel, `<topic>.dlq`.
    pub fn dead_letter(&self) -> Topic {
        Topic::new(format!("{}{}", self.0, Self::DEAD_LETTER_SUFFIX))
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Topic {
    fn from(name: &str) -> Self {
        Topic::new(name)
    }
}

impl From<String> for Topic {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl Serialize for Topic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Topic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Topic::from)
    }
}

/// An independently ordered sub-stream of a topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TopicPartition {
    pub topic: Topic,
    pub partition: i32,
}

impl TopicPartition {
    pub fn new(topic: impl Into<Topic>, partition: i32) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.topic, self.partition)
    }
}

/// Identity of a message: its position in the log.
///
/// Offsets are only comparable within one partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId {
    pub topic: Topic,
    pub partition: i32,
    pub offset: i64,
}

impl MessageId {
    pub fn new(topic: impl Into<Topic>, partition: i32, offset: i64) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
        }
    }

    pub fn topic_partition(&self) -> TopicPartition {
        TopicPartition {
            topic: self.topic.clone(),
            partition: self.partition,
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]@{}", self.topic, self.partition, self.offset)
    }
}

/// Marker for the kind of record an [`Id`] identifies.
pub trait IdMarker: Send + Sync + 'static {
    /// Prefix used by `Display` and by the serialized form.
    fn prefix() -> &'static str;
}

/// ULID-backed identifier, typed by a zero-sized marker.
#[repr(transparent)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

// Manual impls: derives would put bounds on the marker type.
impl<T: IdMarker> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: IdMarker> Copy for Id<T> {}

impl<T: IdMarker> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ulid == other.ulid
    }
}

impl<T: IdMarker> Eq for Id<T> {}

impl<T: IdMarker> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.ulid.hash(state);
    }
}

impl<T: IdMarker> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({self})")
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de, T: IdMarker> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let body = raw.strip_prefix(T::prefix()).ok_or_else(|| {
            D::Error::custom(format!("expected `{}` prefix in `{raw}`", T::prefix()))
        })?;
        Ulid::from_string(body)
            .map(Self::from_ulid)
            .map_err(D::Error::custom)
    }
}

/// Marker for dead-letter records.
#[derive(Debug)]
pub enum DeadLetter {}

impl IdMarker for DeadLetter {
    fn prefix() -> &'static str {
        "dlq-"
    }
}

/// Identifier of one published dead-letter record.
pub type DeadLetterId = Id<DeadLetter>;
