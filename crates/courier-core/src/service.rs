//! The messaging service facade.
//!
//! Single entry point for topic administration, publish/store, the
//! commit/abort notification channel and fetch. Concurrency model: requests
//! against different topics run fully in parallel; the append path of one
//! topic (id allocation + log write) is serialized behind a per-topic writer
//! lock; fetches are lock-free scans that observe a consistent prefix of the
//! log.

use crate::error::{CourierError, Result};
use crate::message_store::{MessageScan, MessageStore};
use crate::metadata_store::MetadataStore;
use crate::payload_store::PayloadStore;
use crate::sequence::SequenceAllocator;
use crate::transaction::TransactionGate;
use chrono::Utc;
use courier_commons::{
    Message, MessageEntry, MessageId, MessagingConfig, NamespaceId, RollbackRange, StoreRequest,
    TopicId, TopicMetadata,
};
use courier_store::StorageBackend;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-topic writer state, held under the topic's writer lock.
///
/// The allocator is seeded lazily on first write (and re-seeded when the
/// topic's generation changes) from the highest position persisted in either
/// store, so a process restart can never re-issue a used id.
#[derive(Default)]
struct TopicWriter {
    allocator: Option<SequenceAllocator>,
}

pub struct MessagingService {
    backend: Arc<dyn StorageBackend>,
    metadata: MetadataStore,
    messages: MessageStore,
    payloads: PayloadStore,
    gate: Arc<dyn TransactionGate>,
    config: MessagingConfig,
    writers: DashMap<TopicId, Arc<Mutex<TopicWriter>>>,
}

impl MessagingService {
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        gate: Arc<dyn TransactionGate>,
        config: MessagingConfig,
    ) -> Result<Self> {
        let metadata = MetadataStore::new(backend.clone())?;
        let messages = MessageStore::new(backend.clone())?;
        let payloads = PayloadStore::new(backend.clone())?;
        Ok(Self {
            backend,
            metadata,
            messages,
            payloads,
            gate,
            config,
            writers: DashMap::new(),
        })
    }

    // ---- topic administration ----

    /// Creates a topic. Absent `ttl` is filled from the configured default;
    /// an unparsable or negative `ttl` fails with `BadRequest`.
    pub fn create_topic(
        &self,
        topic_id: &TopicId,
        properties: HashMap<String, String>,
    ) -> Result<TopicMetadata> {
        let properties = self.apply_default_ttl(properties);
        validate_properties(topic_id, &properties)?;
        let lock = self.writer(topic_id);
        let mut writer = lock.lock();
        let metadata = self.metadata.create(topic_id, properties)?;
        writer.allocator = None;
        log::info!(
            "Created topic {} at generation {}",
            topic_id,
            metadata.generation()
        );
        Ok(metadata)
    }

    /// Replaces a topic's properties. The generation is unchanged; absent
    /// `ttl` is filled from the configured default.
    pub fn update_topic(
        &self,
        topic_id: &TopicId,
        properties: HashMap<String, String>,
    ) -> Result<TopicMetadata> {
        let properties = self.apply_default_ttl(properties);
        validate_properties(topic_id, &properties)?;
        let lock = self.writer(topic_id);
        let _writer = lock.lock();
        self.metadata.update(topic_id, properties)
    }

    pub fn get_topic(&self, topic_id: &TopicId) -> Result<TopicMetadata> {
        self.metadata.get(topic_id)
    }

    /// Lists live topic names in a namespace, in name order.
    pub fn list_topics(&self, namespace: &NamespaceId) -> Result<Vec<String>> {
        Ok(self
            .metadata
            .list(namespace)?
            .into_iter()
            .map(|m| m.topic_id().name().to_string())
            .collect())
    }

    /// Deletes a topic. Its data is left for the TTL sweep to purge; the
    /// generation counter survives so a recreate starts a fresh log.
    pub fn delete_topic(&self, topic_id: &TopicId) -> Result<()> {
        let lock = self.writer(topic_id);
        let mut writer = lock.lock();
        let deleted = self.metadata.delete(topic_id)?;
        writer.allocator = None;
        log::info!(
            "Deleted topic {} (generation {} retired)",
            topic_id,
            deleted.generation()
        );
        Ok(())
    }

    // ---- publish / store ----

    /// Publishes the request's payloads to the message log, assigning each a
    /// MessageId under the topic's writer lock.
    ///
    /// Returns the inclusive id range written, or `Ok(None)` for a
    /// transactional request with no payloads (a valid no-op placeholder).
    /// A non-transactional request with no payloads fails `BadRequest`.
    pub fn publish(&self, mut request: StoreRequest) -> Result<Option<RollbackRange>> {
        let topic_id = request.topic_id().clone();
        let write_pointer = request.write_pointer();

        let lock = self.writer(&topic_id);
        let mut writer = lock.lock();
        let metadata = self.metadata.get(&topic_id)?;
        let generation = metadata.generation();

        let Some(first_payload) = request.next() else {
            if write_pointer.is_some() {
                return Ok(None);
            }
            return Err(CourierError::BadRequest(format!(
                "publish to {} carries no payloads and no write pointer",
                topic_id
            )));
        };

        let allocator = self.allocator(&mut writer, &topic_id, generation)?;
        let mut entries = Vec::new();
        let mut payload = first_payload;
        loop {
            let (ts, seq) = allocator.next(Utc::now().timestamp_millis());
            let id = match write_pointer {
                Some(wp) => MessageId::transactional(generation, ts, seq, wp),
                None => MessageId::new(generation, ts, seq),
            };
            entries.push((
                id,
                MessageEntry {
                    write_pointer,
                    payload,
                },
            ));
            match request.next() {
                Some(next) => payload = next,
                None => break,
            }
        }

        self.messages.append_batch(&topic_id, generation, &entries)?;
        let first = entries[0].0;
        let last = entries[entries.len() - 1].0;
        log::debug!(
            "Published {} message(s) to {} in [{}, {}]",
            entries.len(),
            topic_id,
            first,
            last
        );
        Ok(Some(RollbackRange {
            topic_id,
            generation,
            write_pointer,
            staged: false,
            first,
            last,
        }))
    }

    /// Stages the request's payloads in the payload store under its write
    /// pointer, invisible to fetch until [`MessagingService::finalize`].
    ///
    /// Requires a transactional request with at least one payload.
    pub fn store_payload(&self, mut request: StoreRequest) -> Result<RollbackRange> {
        let topic_id = request.topic_id().clone();
        let Some(write_pointer) = request.write_pointer() else {
            return Err(CourierError::BadRequest(format!(
                "store to {} requires a transaction write pointer",
                topic_id
            )));
        };

        let lock = self.writer(&topic_id);
        let mut writer = lock.lock();
        let metadata = self.metadata.get(&topic_id)?;
        let generation = metadata.generation();

        let Some(first_payload) = request.next() else {
            return Err(CourierError::BadRequest(format!(
                "store to {} requires at least one payload",
                topic_id
            )));
        };

        let allocator = self.allocator(&mut writer, &topic_id, generation)?;
        let mut entries = Vec::new();
        let mut payload = first_payload;
        loop {
            let (ts, seq) = allocator.next(Utc::now().timestamp_millis());
            entries.push((
                MessageId::transactional(generation, ts, seq, write_pointer),
                payload,
            ));
            match request.next() {
                Some(next) => payload = next,
                None => break,
            }
        }

        self.payloads.stage_batch(&topic_id, write_pointer, &entries)?;
        let first = entries[0].0;
        let last = entries[entries.len() - 1].0;
        log::debug!(
            "Staged {} payload(s) for {} under write pointer {}",
            entries.len(),
            topic_id,
            write_pointer
        );
        Ok(RollbackRange {
            topic_id,
            generation,
            write_pointer: Some(write_pointer),
            staged: true,
            first,
            last,
        })
    }

    // ---- transaction notification channel ----

    /// Deletes exactly the id range one publish/store call wrote, from
    /// whichever store it landed in. Idempotent; rolling back twice is a
    /// no-op. Returns the number of entries removed.
    pub fn rollback(&self, range: &RollbackRange) -> Result<usize> {
        let first = range.first.position();
        let last = range.last.position();
        if range.staged {
            let Some(write_pointer) = range.write_pointer else {
                return Err(CourierError::BadRequest(format!(
                    "staged rollback range for {} carries no write pointer",
                    range.topic_id
                )));
            };
            self.payloads
                .delete_position_range(&range.topic_id, write_pointer, first, last)
        } else {
            self.messages
                .delete_position_range(&range.topic_id, range.generation, first, last)
        }
    }

    /// Commit notification: atomically moves everything staged under
    /// `write_pointer` into the message log, under the original ids.
    /// Returns the number of messages finalized.
    pub fn finalize(&self, topic_id: &TopicId, write_pointer: i64) -> Result<usize> {
        let staged = self.payloads.staged(topic_id, write_pointer)?;
        if staged.is_empty() {
            return Ok(0);
        }
        let mut operations = Vec::with_capacity(staged.len() * 2);
        for entry in &staged {
            let id = entry.message_id(write_pointer);
            let message = MessageEntry {
                write_pointer: Some(write_pointer),
                payload: entry.payload.clone(),
            };
            operations.push(
                self.messages
                    .put_operation(topic_id, entry.generation, &id, &message)?,
            );
            operations.push(self.payloads.delete_operation(topic_id, write_pointer, entry));
        }
        self.backend.batch(operations)?;
        log::debug!(
            "Finalized {} message(s) for {} under write pointer {}",
            staged.len(),
            topic_id,
            write_pointer
        );
        Ok(staged.len())
    }

    /// Abort notification: drops everything staged under `write_pointer`.
    /// Idempotent. Returns the number of payloads discarded.
    pub fn abort(&self, topic_id: &TopicId, write_pointer: i64) -> Result<usize> {
        self.payloads.discard(topic_id, write_pointer)
    }

    // ---- fetch ----

    /// Fetches up to `limit` messages from the topic's current generation,
    /// starting at `start` (inclusive) when given.
    ///
    /// Entries carrying a write pointer are filtered through the transaction
    /// gate: invalidated ones are skipped, and when `snapshot` is given so
    /// are entries not yet visible at that snapshot. A cursor from a retired
    /// generation yields nothing; callers restart from the beginning after a
    /// topic recreate.
    ///
    /// The returned iterator is lazy, finite and not restartable.
    pub fn fetch(
        &self,
        topic_id: &TopicId,
        start: Option<&MessageId>,
        limit: usize,
        snapshot: Option<i64>,
    ) -> Result<FetchIterator<'_>> {
        let metadata = self.metadata.get(topic_id)?;
        let generation = metadata.generation();

        if let Some(start_id) = start {
            if start_id.generation != generation {
                return Ok(FetchIterator::empty(self.gate.clone()));
            }
        }

        let scan = self
            .messages
            .scan(topic_id, generation, start.map(MessageId::position))?;
        Ok(FetchIterator {
            scan: Some(scan),
            gate: self.gate.clone(),
            snapshot,
            remaining: limit,
        })
    }

    // ---- internals ----

    fn writer(&self, topic_id: &TopicId) -> Arc<Mutex<TopicWriter>> {
        self.writers.entry(topic_id.clone()).or_default().clone()
    }

    /// Returns the writer's allocator, (re)seeding it when absent or left
    /// over from another generation.
    fn allocator<'w>(
        &self,
        writer: &'w mut TopicWriter,
        topic_id: &TopicId,
        generation: i32,
    ) -> Result<&'w mut SequenceAllocator> {
        let stale = writer
            .allocator
            .as_ref()
            .map_or(true, |a| a.generation() != generation);
        if stale {
            let persisted = self.messages.latest_position(topic_id, generation)?;
            let staged = self.payloads.latest_position(topic_id, generation)?;
            let last = match (persisted, staged) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (position, None) | (None, position) => position,
            };
            writer.allocator = Some(SequenceAllocator::seeded(generation, last));
        }
        Ok(writer
            .allocator
            .get_or_insert_with(|| SequenceAllocator::new(generation)))
    }

    fn apply_default_ttl(&self, mut properties: HashMap<String, String>) -> HashMap<String, String> {
        properties
            .entry(TopicMetadata::TTL_KEY.to_string())
            .or_insert_with(|| self.config.default_ttl_seconds.to_string());
        properties
    }
}

fn validate_properties(topic_id: &TopicId, properties: &HashMap<String, String>) -> Result<()> {
    TopicMetadata::new(topic_id.clone(), 0, properties.clone()).validate()?;
    Ok(())
}

/// Lazy, gate-filtered view over one generation of a topic's log.
pub struct FetchIterator<'a> {
    scan: Option<MessageScan<'a>>,
    gate: Arc<dyn TransactionGate>,
    snapshot: Option<i64>,
    remaining: usize,
}

impl<'a> FetchIterator<'a> {
    fn empty(gate: Arc<dyn TransactionGate>) -> Self {
        Self {
            scan: None,
            gate,
            snapshot: None,
            remaining: 0,
        }
    }
}

impl Iterator for FetchIterator<'_> {
    type Item = Message;

    fn next(&mut self) -> Option<Message> {
        if self.remaining == 0 {
            return None;
        }
        let scan = self.scan.as_mut()?;
        for (id, entry) in scan.by_ref() {
            if let Some(wp) = entry.write_pointer {
                if self.gate.is_invalidated(wp) {
                    continue;
                }
                if let Some(snapshot) = self.snapshot {
                    if !self.gate.is_visible(wp, snapshot) {
                        continue;
                    }
                }
            }
            self.remaining -= 1;
            return Some(Message::new(id, entry.payload));
        }
        None
    }
}
