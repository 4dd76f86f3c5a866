//! The message log.
//!
//! Messages live in the `messages` partition keyed by
//! `(topic, generation, timestamp, sequence)`, so an ordered scan over one
//! generation's prefix yields messages in publish order. Values are
//! bincode-encoded [`MessageEntry`] records.

use crate::codec;
use crate::error::Result;
use crate::keys;
use courier_commons::{MessageEntry, MessageId, TopicId};
use courier_store::{KvIterator, Operation, Partition, StorageBackend};
use std::sync::Arc;

#[derive(Clone)]
pub struct MessageStore {
    backend: Arc<dyn StorageBackend>,
    partition: Partition,
}

impl MessageStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Result<Self> {
        let partition = keys::message_partition();
        backend.create_partition(&partition)?;
        Ok(Self { backend, partition })
    }

    /// Appends a batch atomically. Ids must be in ascending order and belong
    /// to `generation`; the caller's writer lock guarantees both.
    pub fn append_batch(
        &self,
        topic_id: &TopicId,
        generation: i32,
        entries: &[(MessageId, MessageEntry)],
    ) -> Result<()> {
        let mut operations = Vec::with_capacity(entries.len());
        for (id, entry) in entries {
            operations.push(self.put_operation(topic_id, generation, id, entry)?);
        }
        self.backend.batch(operations)?;
        Ok(())
    }

    /// Builds the put for one log row, for callers composing a larger
    /// atomic batch (transaction finalization writes messages and deletes
    /// staged payloads in one go).
    pub fn put_operation(
        &self,
        topic_id: &TopicId,
        generation: i32,
        id: &MessageId,
        entry: &MessageEntry,
    ) -> Result<Operation> {
        let key = keys::message_key(topic_id, generation, id.timestamp_millis, id.sequence_id);
        let value = codec::encode(entry)?;
        Ok(Operation::Put {
            partition: self.partition.clone(),
            key,
            value,
        })
    }

    /// Scans one generation in id order, starting at `start` (inclusive)
    /// when given.
    pub fn scan(
        &self,
        topic_id: &TopicId,
        generation: i32,
        start: Option<(i64, u16)>,
    ) -> Result<MessageScan<'_>> {
        let prefix = keys::message_prefix(topic_id, generation);
        let start_key = start.map(|(ts, seq)| keys::message_key(topic_id, generation, ts, seq));
        let inner = self.backend.scan(
            &self.partition,
            Some(&prefix),
            start_key.as_deref(),
            None,
        )?;
        Ok(MessageScan { inner, generation })
    }

    /// Highest persisted position in a generation, for allocator recovery.
    pub fn latest_position(&self, topic_id: &TopicId, generation: i32) -> Result<Option<(i64, u16)>> {
        let from = keys::message_key(topic_id, generation, i64::MIN, 0);
        let to = keys::message_key(topic_id, generation, i64::MAX, u16::MAX);
        let last = self.backend.last_in_range(&self.partition, &from, &to)?;
        Ok(last.and_then(|(key, _)| keys::decode_message_key(&key).map(|(_, ts, seq)| (ts, seq))))
    }

    /// Deletes every message of a generation older than `cutoff_millis`,
    /// returning the number removed.
    pub fn delete_before(
        &self,
        topic_id: &TopicId,
        generation: i32,
        cutoff_millis: i64,
    ) -> Result<usize> {
        let from = keys::message_key(topic_id, generation, i64::MIN, 0);
        let to = keys::message_key(topic_id, generation, cutoff_millis.saturating_sub(1), u16::MAX);
        Ok(self.backend.delete_range(&self.partition, &from, &to)?)
    }

    /// Deletes every message belonging to a generation older than
    /// `current_generation`. Used to purge data of deleted/recreated topics.
    pub fn delete_retired_generations(
        &self,
        topic_id: &TopicId,
        current_generation: i32,
    ) -> Result<usize> {
        if current_generation <= 1 {
            return Ok(0);
        }
        let from = keys::message_key(topic_id, 1, i64::MIN, 0);
        let to = keys::message_key(topic_id, current_generation - 1, i64::MAX, u16::MAX);
        Ok(self.backend.delete_range(&self.partition, &from, &to)?)
    }

    /// Deletes the inclusive position range `[first, last]` of a generation,
    /// returning the number removed. Idempotent.
    pub fn delete_position_range(
        &self,
        topic_id: &TopicId,
        generation: i32,
        first: (i64, u16),
        last: (i64, u16),
    ) -> Result<usize> {
        let from = keys::message_key(topic_id, generation, first.0, first.1);
        let to = keys::message_key(topic_id, generation, last.0, last.1);
        Ok(self.backend.delete_range(&self.partition, &from, &to)?)
    }
}

/// Lazy iterator over one generation's log in id order.
///
/// Rows whose values fail to decode are logged and skipped rather than
/// aborting the scan.
pub struct MessageScan<'a> {
    inner: KvIterator<'a>,
    generation: i32,
}

impl Iterator for MessageScan<'_> {
    type Item = (MessageId, MessageEntry);

    fn next(&mut self) -> Option<Self::Item> {
        for (key, value) in self.inner.by_ref() {
            let Some((_, ts, seq)) = keys::decode_message_key(&key) else {
                log::warn!("Skipping undecodable message key ({} bytes)", key.len());
                continue;
            };
            let entry: MessageEntry = match codec::decode(&value) {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping corrupt message entry at {}:{}: {}", ts, seq, e);
                    continue;
                }
            };
            let id = match entry.write_pointer {
                Some(wp) => MessageId::transactional(self.generation, ts, seq, wp),
                None => MessageId::new(self.generation, ts, seq),
            };
            return Some((id, entry));
        }
        None
    }
}
