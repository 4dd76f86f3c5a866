//! Message envelope and stored entry formats.

use crate::ids::MessageId;
use serde::{Deserialize, Serialize};

/// A message returned from a fetch: identifier plus payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(id: MessageId, payload: Vec<u8>) -> Self {
        Self { id, payload }
    }
}

/// Value stored in the message log.
///
/// The key already carries `(topic, generation, timestamp, sequence)`; the
/// value keeps the payload and, for transactional writes, the write pointer
/// consulted by the transaction gate at fetch time.
///
/// Serialized with bincode (compact binary format).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub write_pointer: Option<i64>,
    pub payload: Vec<u8>,
}

/// Value staged in the payload store for a transactional write.
///
/// The key is `(topic, write_pointer, timestamp, sequence)`; the entry keeps
/// the full assigned log position so finalization can re-insert the payload
/// into the message log under its original MessageId.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadEntry {
    pub generation: i32,
    pub timestamp_millis: i64,
    pub sequence_id: u16,
    pub payload: Vec<u8>,
}

impl PayloadEntry {
    /// Reconstructs the MessageId this payload was staged under.
    pub fn message_id(&self, write_pointer: i64) -> MessageId {
        MessageId::transactional(
            self.generation,
            self.timestamp_millis,
            self.sequence_id,
            write_pointer,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_roundtrip() {
        let entry = MessageEntry {
            write_pointer: Some(99),
            payload: b"hello".to_vec(),
        };
        let bytes = bincode::serde::encode_to_vec(&entry, bincode::config::standard()).unwrap();
        let (decoded, _) = bincode::serde::decode_from_slice::<MessageEntry, _>(
            &bytes,
            bincode::config::standard(),
        )
        .unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_payload_entry_message_id() {
        let entry = PayloadEntry {
            generation: 2,
            timestamp_millis: 1_000,
            sequence_id: 4,
            payload: b"x".to_vec(),
        };
        let id = entry.message_id(7);
        assert_eq!(id.generation, 2);
        assert_eq!(id.position(), (1_000, 4));
        assert_eq!(id.write_pointer, Some(7));
    }
}
