//! Message identifiers with a total per-topic order.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier of a single message within a topic.
///
/// The position of a message in its log is `(timestamp_millis, sequence_id)`;
/// `sequence_id` disambiguates messages allocated within the same
/// millisecond (or during a clock stall). The `generation` identifies which
/// lifetime of the topic the message belongs to; messages from different
/// generations live in logically independent logs and are never compared for
/// ordering purposes.
///
/// `write_pointer` carries the transaction identifier for transactionally
/// published messages. It is excluded from ordering, equality and hashing:
/// two ids with equal `(generation, timestamp_millis, sequence_id)` denote
/// the same message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MessageId {
    pub generation: i32,
    pub timestamp_millis: i64,
    pub sequence_id: u16,
    pub write_pointer: Option<i64>,
}

impl MessageId {
    /// Creates a non-transactional message id.
    pub fn new(generation: i32, timestamp_millis: i64, sequence_id: u16) -> Self {
        Self {
            generation,
            timestamp_millis,
            sequence_id,
            write_pointer: None,
        }
    }

    /// Creates a transactional message id carrying a write pointer.
    pub fn transactional(
        generation: i32,
        timestamp_millis: i64,
        sequence_id: u16,
        write_pointer: i64,
    ) -> Self {
        Self {
            generation,
            timestamp_millis,
            sequence_id,
            write_pointer: Some(write_pointer),
        }
    }

    /// Returns the `(timestamp_millis, sequence_id)` position of this id
    /// within its generation's log.
    pub fn position(&self) -> (i64, u16) {
        (self.timestamp_millis, self.sequence_id)
    }
}

impl PartialEq for MessageId {
    fn eq(&self, other: &Self) -> bool {
        self.generation == other.generation
            && self.timestamp_millis == other.timestamp_millis
            && self.sequence_id == other.sequence_id
    }
}

impl Eq for MessageId {}

impl Hash for MessageId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.generation.hash(state);
        self.timestamp_millis.hash(state);
        self.sequence_id.hash(state);
    }
}

impl PartialOrd for MessageId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MessageId {
    /// Orders by log position only. Callers must not compare ids from
    /// different generations; the generation is deliberately not part of
    /// the order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.position().cmp(&other.position())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.write_pointer {
            Some(wp) => write!(
                f,
                "{}:{}:{}@tx{}",
                self.generation, self.timestamp_millis, self.sequence_id, wp
            ),
            None => write!(
                f,
                "{}:{}:{}",
                self.generation, self.timestamp_millis, self.sequence_id
            ),
        }
    }
}
