//! Publish/store requests and the rollback range they produce.

use crate::ids::{MessageId, TopicId};

/// A publish or store request: target topic, optional transaction write
/// pointer and a single-pass sequence of payloads.
///
/// The payload sequence is finite but **not restartable**: once consumed it
/// cannot be replayed, so a retry requires constructing a fresh request.
pub struct StoreRequest {
    topic_id: TopicId,
    write_pointer: Option<i64>,
    payloads: Box<dyn Iterator<Item = Vec<u8>> + Send>,
}

impl StoreRequest {
    /// Creates a non-transactional request.
    pub fn new<I>(topic_id: TopicId, payloads: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
        I::IntoIter: Send + 'static,
    {
        Self {
            topic_id,
            write_pointer: None,
            payloads: Box::new(payloads.into_iter()),
        }
    }

    /// Creates a transactional request staged under `write_pointer`.
    pub fn transactional<I>(topic_id: TopicId, write_pointer: i64, payloads: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
        I::IntoIter: Send + 'static,
    {
        Self {
            topic_id,
            write_pointer: Some(write_pointer),
            payloads: Box::new(payloads.into_iter()),
        }
    }

    pub fn topic_id(&self) -> &TopicId {
        &self.topic_id
    }

    pub fn write_pointer(&self) -> Option<i64> {
        self.write_pointer
    }

    pub fn is_transactional(&self) -> bool {
        self.write_pointer.is_some()
    }
}

impl Iterator for StoreRequest {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        self.payloads.next()
    }
}

impl std::fmt::Debug for StoreRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRequest")
            .field("topic_id", &self.topic_id)
            .field("write_pointer", &self.write_pointer)
            .finish_non_exhaustive()
    }
}

/// The inclusive MessageId range written by a single publish/store call.
///
/// Handed back to the caller so that a transaction abort can delete exactly
/// the entries written under an aborted write pointer. `staged` records
/// whether the write landed in the payload store (transactional store) or
/// the message log (publish).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackRange {
    pub topic_id: TopicId,
    pub generation: i32,
    pub write_pointer: Option<i64>,
    pub staged: bool,
    pub first: MessageId,
    pub last: MessageId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::NamespaceId;

    fn topic() -> TopicId {
        TopicId::new(NamespaceId::new("app"), "events")
    }

    #[test]
    fn test_payloads_are_single_pass() {
        let mut req = StoreRequest::new(topic(), vec![b"a".to_vec(), b"b".to_vec()]);
        assert!(!req.is_transactional());
        assert_eq!(req.next(), Some(b"a".to_vec()));
        assert_eq!(req.next(), Some(b"b".to_vec()));
        assert_eq!(req.next(), None);
        // Exhausted for good.
        assert_eq!(req.next(), None);
    }

    #[test]
    fn test_transactional_flag() {
        let req = StoreRequest::transactional(topic(), 42, Vec::<Vec<u8>>::new());
        assert!(req.is_transactional());
        assert_eq!(req.write_pointer(), Some(42));
    }
}
