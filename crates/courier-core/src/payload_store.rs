//! The staged payload store.
//!
//! Payloads of in-flight transactions live in the `payloads` partition keyed
//! by `(topic, write_pointer, timestamp, sequence)`, grouped by write
//! pointer so commit and abort are prefix operations. Values are
//! bincode-encoded [`PayloadEntry`] records carrying the full assigned log
//! position, which lets finalization move each payload into the message log
//! under its original id.

use crate::codec;
use crate::error::Result;
use crate::keys;
use courier_commons::{MessageId, PayloadEntry, TopicId};
use courier_store::{Operation, Partition, StorageBackend};
use std::sync::Arc;

#[derive(Clone)]
pub struct PayloadStore {
    backend: Arc<dyn StorageBackend>,
    partition: Partition,
}

impl PayloadStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Result<Self> {
        let partition = keys::payload_partition();
        backend.create_partition(&partition)?;
        Ok(Self { backend, partition })
    }

    /// Stages a batch atomically under `write_pointer`. Ids must carry the
    /// same write pointer and ascend in position order.
    pub fn stage_batch(
        &self,
        topic_id: &TopicId,
        write_pointer: i64,
        entries: &[(MessageId, Vec<u8>)],
    ) -> Result<()> {
        let mut operations = Vec::with_capacity(entries.len());
        for (id, payload) in entries {
            let key =
                keys::payload_key(topic_id, write_pointer, id.timestamp_millis, id.sequence_id);
            let entry = PayloadEntry {
                generation: id.generation,
                timestamp_millis: id.timestamp_millis,
                sequence_id: id.sequence_id,
                payload: payload.clone(),
            };
            operations.push(Operation::Put {
                partition: self.partition.clone(),
                key,
                value: codec::encode(&entry)?,
            });
        }
        self.backend.batch(operations)?;
        Ok(())
    }

    /// Returns every payload staged under `write_pointer`, in position order.
    pub fn staged(&self, topic_id: &TopicId, write_pointer: i64) -> Result<Vec<PayloadEntry>> {
        let prefix = keys::payload_prefix(topic_id, write_pointer);
        let iter = self.backend.scan(&self.partition, Some(&prefix), None, None)?;
        let mut entries = Vec::new();
        for (key, value) in iter {
            match codec::decode::<PayloadEntry>(&value) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    log::warn!("Skipping corrupt staged payload ({} bytes key): {}", key.len(), e);
                }
            }
        }
        Ok(entries)
    }

    /// Builds the delete for one staged row, for callers composing a larger
    /// atomic batch.
    pub fn delete_operation(
        &self,
        topic_id: &TopicId,
        write_pointer: i64,
        entry: &PayloadEntry,
    ) -> Operation {
        Operation::Delete {
            partition: self.partition.clone(),
            key: keys::payload_key(
                topic_id,
                write_pointer,
                entry.timestamp_millis,
                entry.sequence_id,
            ),
        }
    }

    /// Drops everything staged under `write_pointer`, returning the number
    /// of entries removed. Idempotent.
    pub fn discard(&self, topic_id: &TopicId, write_pointer: i64) -> Result<usize> {
        let from = keys::payload_key(topic_id, write_pointer, i64::MIN, 0);
        let to = keys::payload_key(topic_id, write_pointer, i64::MAX, u16::MAX);
        Ok(self.backend.delete_range(&self.partition, &from, &to)?)
    }

    /// Deletes the inclusive position range `[first, last]` staged under
    /// `write_pointer`. Idempotent.
    pub fn delete_position_range(
        &self,
        topic_id: &TopicId,
        write_pointer: i64,
        first: (i64, u16),
        last: (i64, u16),
    ) -> Result<usize> {
        let from = keys::payload_key(topic_id, write_pointer, first.0, first.1);
        let to = keys::payload_key(topic_id, write_pointer, last.0, last.1);
        Ok(self.backend.delete_range(&self.partition, &from, &to)?)
    }

    /// Highest position staged for `generation` across all write pointers of
    /// a topic, for allocator recovery.
    pub fn latest_position(&self, topic_id: &TopicId, generation: i32) -> Result<Option<(i64, u16)>> {
        let prefix = keys::topic_prefix(topic_id);
        let iter = self.backend.scan(&self.partition, Some(&prefix), None, None)?;
        let mut latest: Option<(i64, u16)> = None;
        for (_, value) in iter {
            let Ok(entry) = codec::decode::<PayloadEntry>(&value) else {
                continue;
            };
            if entry.generation != generation {
                continue;
            }
            let position = (entry.timestamp_millis, entry.sequence_id);
            if latest.map_or(true, |p| position > p) {
                latest = Some(position);
            }
        }
        Ok(latest)
    }

    /// Deletes staged payloads older than `cutoff_millis` across every write
    /// pointer of a topic, returning the number removed. Catches payloads of
    /// transactions that never committed or aborted.
    pub fn delete_before(&self, topic_id: &TopicId, cutoff_millis: i64) -> Result<usize> {
        let prefix = keys::topic_prefix(topic_id);
        let iter = self.backend.scan(&self.partition, Some(&prefix), None, None)?;
        let mut operations = Vec::new();
        for (key, value) in iter {
            let Ok(entry) = codec::decode::<PayloadEntry>(&value) else {
                continue;
            };
            if entry.timestamp_millis < cutoff_millis {
                operations.push(Operation::Delete {
                    partition: self.partition.clone(),
                    key,
                });
            }
        }
        let count = operations.len();
        if count > 0 {
            self.backend.batch(operations)?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_commons::NamespaceId;
    use courier_store::InMemoryBackend;

    fn store() -> PayloadStore {
        PayloadStore::new(Arc::new(InMemoryBackend::new())).unwrap()
    }

    fn topic() -> TopicId {
        TopicId::new(NamespaceId::new("app"), "events")
    }

    fn stage(store: &PayloadStore, wp: i64, ts: i64, seq: u16, payload: &[u8]) {
        let id = MessageId::transactional(1, ts, seq, wp);
        store
            .stage_batch(&topic(), wp, &[(id, payload.to_vec())])
            .unwrap();
    }

    #[test]
    fn test_staged_grouped_by_write_pointer() {
        let store = store();
        stage(&store, 7, 100, 0, b"a");
        stage(&store, 7, 100, 1, b"b");
        stage(&store, 9, 100, 2, b"other");

        let staged = store.staged(&topic(), 7).unwrap();
        assert_eq!(staged.len(), 2);
        assert_eq!(staged[0].payload, b"a");
        assert_eq!(staged[1].payload, b"b");
        assert_eq!(staged[0].message_id(7).position(), (100, 0));
    }

    #[test]
    fn test_discard_is_idempotent() {
        let store = store();
        stage(&store, 7, 100, 0, b"a");
        stage(&store, 9, 100, 1, b"keep");

        assert_eq!(store.discard(&topic(), 7).unwrap(), 1);
        assert_eq!(store.discard(&topic(), 7).unwrap(), 0);
        assert_eq!(store.staged(&topic(), 9).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_position_range() {
        let store = store();
        stage(&store, 7, 100, 0, b"keep");
        stage(&store, 7, 100, 1, b"drop");
        stage(&store, 7, 200, 0, b"drop");
        stage(&store, 7, 300, 0, b"keep");

        assert_eq!(
            store
                .delete_position_range(&topic(), 7, (100, 1), (200, 0))
                .unwrap(),
            2
        );
        let staged = store.staged(&topic(), 7).unwrap();
        assert_eq!(staged.len(), 2);
    }

    #[test]
    fn test_latest_position_filters_by_generation() {
        let store = store();
        stage(&store, 7, 100, 0, b"a");
        stage(&store, 9, 300, 0, b"b");
        store
            .stage_batch(
                &topic(),
                11,
                &[(MessageId::transactional(2, 500, 0, 11), b"next-gen".to_vec())],
            )
            .unwrap();

        assert_eq!(store.latest_position(&topic(), 1).unwrap(), Some((300, 0)));
        assert_eq!(store.latest_position(&topic(), 2).unwrap(), Some((500, 0)));
        assert_eq!(store.latest_position(&topic(), 3).unwrap(), None);
    }

    #[test]
    fn test_delete_before_sweeps_all_write_pointers() {
        let store = store();
        stage(&store, 7, 100, 0, b"expired");
        stage(&store, 9, 150, 0, b"expired");
        stage(&store, 9, 500, 0, b"fresh");

        assert_eq!(store.delete_before(&topic(), 200).unwrap(), 2);
        assert_eq!(store.delete_before(&topic(), 200).unwrap(), 0);
        assert_eq!(store.staged(&topic(), 9).unwrap().len(), 1);
    }
}
