//! Topic metadata store.
//!
//! One row per topic name ever created, keyed by `namespace \0 name \0`.
//! The row keeps the generation counter and the live property map; deleting
//! a topic clears the properties but keeps the row as a tombstone, so the
//! generation counter survives deletion and a recreate can never reuse a
//! generation number.

use crate::codec;
use crate::error::{CourierError, Result};
use crate::keys;
use courier_commons::{NamespaceId, TopicId, TopicMetadata};
use courier_store::{Partition, StorageBackend};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Persisted metadata row. `properties` is `None` for tombstones of deleted
/// topics.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TopicRecord {
    generation: i32,
    properties: Option<HashMap<String, String>>,
}

impl TopicRecord {
    fn is_live(&self) -> bool {
        self.properties.is_some()
    }
}

/// Store for topic metadata rows.
#[derive(Clone)]
pub struct MetadataStore {
    backend: Arc<dyn StorageBackend>,
    partition: Partition,
}

impl MetadataStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Result<Self> {
        let partition = keys::metadata_partition();
        backend.create_partition(&partition)?;
        Ok(Self { backend, partition })
    }

    fn load(&self, topic_id: &TopicId) -> Result<Option<TopicRecord>> {
        let key = keys::metadata_key(topic_id);
        match self.backend.get(&self.partition, &key)? {
            Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save(&self, topic_id: &TopicId, record: &TopicRecord) -> Result<()> {
        let key = keys::metadata_key(topic_id);
        let value = codec::encode(record)?;
        self.backend.put(&self.partition, &key, &value)?;
        Ok(())
    }

    /// Creates a topic, bumping the generation past any previous lifetime.
    ///
    /// Returns `TopicAlreadyExists` if the topic is currently live.
    pub fn create(
        &self,
        topic_id: &TopicId,
        properties: HashMap<String, String>,
    ) -> Result<TopicMetadata> {
        let previous = self.load(topic_id)?;
        if let Some(record) = &previous {
            if record.is_live() {
                return Err(CourierError::TopicAlreadyExists(topic_id.clone()));
            }
        }
        let generation = previous.map(|r| r.generation).unwrap_or(0) + 1;
        let record = TopicRecord {
            generation,
            properties: Some(properties.clone()),
        };
        self.save(topic_id, &record)?;
        log::debug!("Created topic {} at generation {}", topic_id, generation);
        Ok(TopicMetadata::new(topic_id.clone(), generation, properties))
    }

    /// Replaces the property map of a live topic. The generation is kept.
    pub fn update(
        &self,
        topic_id: &TopicId,
        properties: HashMap<String, String>,
    ) -> Result<TopicMetadata> {
        let record = self
            .load(topic_id)?
            .filter(TopicRecord::is_live)
            .ok_or_else(|| CourierError::TopicNotFound(topic_id.clone()))?;
        let updated = TopicRecord {
            generation: record.generation,
            properties: Some(properties.clone()),
        };
        self.save(topic_id, &updated)?;
        Ok(TopicMetadata::new(
            topic_id.clone(),
            record.generation,
            properties,
        ))
    }

    /// Returns the metadata of a live topic.
    pub fn get(&self, topic_id: &TopicId) -> Result<TopicMetadata> {
        let record = self
            .load(topic_id)?
            .filter(TopicRecord::is_live)
            .ok_or_else(|| CourierError::TopicNotFound(topic_id.clone()))?;
        let properties = record.properties.unwrap_or_default();
        Ok(TopicMetadata::new(
            topic_id.clone(),
            record.generation,
            properties,
        ))
    }

    /// Marks a live topic deleted, keeping its generation counter.
    ///
    /// Returns the metadata the topic had at deletion time so callers can
    /// clean up the retired generation's data.
    pub fn delete(&self, topic_id: &TopicId) -> Result<TopicMetadata> {
        let current = self.get(topic_id)?;
        let tombstone = TopicRecord {
            generation: current.generation(),
            properties: None,
        };
        self.save(topic_id, &tombstone)?;
        log::debug!(
            "Deleted topic {} (was generation {})",
            topic_id,
            current.generation()
        );
        Ok(current)
    }

    /// Lists live topics in a namespace, in name order.
    pub fn list(&self, namespace: &NamespaceId) -> Result<Vec<TopicMetadata>> {
        let prefix = keys::metadata_namespace_prefix(namespace);
        self.collect(Some(&prefix))
    }

    /// Lists every live topic across all namespaces.
    pub fn list_all(&self) -> Result<Vec<TopicMetadata>> {
        self.collect(None)
    }

    /// Lists tombstones of deleted topics as `(topic, last generation)`,
    /// so cleanup can purge the data they left behind.
    pub fn list_retired(&self) -> Result<Vec<(TopicId, i32)>> {
        let iter = self.backend.scan(&self.partition, None, None, None)?;
        let mut retired = Vec::new();
        for (key, value) in iter {
            let Some(topic_id) = keys::decode_metadata_key(&key) else {
                continue;
            };
            let record: TopicRecord = codec::decode(&value)?;
            if !record.is_live() {
                retired.push((topic_id, record.generation));
            }
        }
        Ok(retired)
    }

    fn collect(&self, prefix: Option<&[u8]>) -> Result<Vec<TopicMetadata>> {
        let iter = self.backend.scan(&self.partition, prefix, None, None)?;
        let mut topics = Vec::new();
        for (key, value) in iter {
            let Some(topic_id) = keys::decode_metadata_key(&key) else {
                log::warn!("Skipping undecodable metadata key ({} bytes)", key.len());
                continue;
            };
            let record: TopicRecord = codec::decode(&value)?;
            if let Some(properties) = record.properties {
                topics.push(TopicMetadata::new(topic_id, record.generation, properties));
            }
        }
        Ok(topics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_store::InMemoryBackend;

    fn store() -> MetadataStore {
        MetadataStore::new(Arc::new(InMemoryBackend::new())).unwrap()
    }

    fn topic(ns: &str, name: &str) -> TopicId {
        TopicId::new(NamespaceId::new(ns), name)
    }

    #[test]
    fn test_create_get() {
        let store = store();
        let t = topic("app", "events");
        let props = HashMap::from([("ttl".to_string(), "60".to_string())]);

        let created = store.create(&t, props.clone()).unwrap();
        assert_eq!(created.generation(), 1);

        let fetched = store.get(&t).unwrap();
        assert_eq!(fetched.generation(), 1);
        assert_eq!(fetched.properties(), &props);
    }

    #[test]
    fn test_create_existing_fails() {
        let store = store();
        let t = topic("app", "events");
        store.create(&t, HashMap::new()).unwrap();
        assert!(matches!(
            store.create(&t, HashMap::new()),
            Err(CourierError::TopicAlreadyExists(_))
        ));
    }

    #[test]
    fn test_generation_survives_delete() {
        let store = store();
        let t = topic("app", "events");

        store.create(&t, HashMap::new()).unwrap();
        store.delete(&t).unwrap();
        assert!(matches!(
            store.get(&t),
            Err(CourierError::TopicNotFound(_))
        ));

        let recreated = store.create(&t, HashMap::new()).unwrap();
        assert_eq!(recreated.generation(), 2);
    }

    #[test]
    fn test_update_keeps_generation() {
        let store = store();
        let t = topic("app", "events");
        store.create(&t, HashMap::new()).unwrap();

        let props = HashMap::from([("ttl".to_string(), "120".to_string())]);
        let updated = store.update(&t, props.clone()).unwrap();
        assert_eq!(updated.generation(), 1);
        assert_eq!(store.get(&t).unwrap().properties(), &props);
    }

    #[test]
    fn test_update_missing_topic_fails() {
        let store = store();
        assert!(matches!(
            store.update(&topic("app", "ghost"), HashMap::new()),
            Err(CourierError::TopicNotFound(_))
        ));
    }

    #[test]
    fn test_list_scoped_to_namespace() {
        let store = store();
        store.create(&topic("app", "a"), HashMap::new()).unwrap();
        store.create(&topic("app", "b"), HashMap::new()).unwrap();
        store.create(&topic("other", "c"), HashMap::new()).unwrap();
        store.delete(&topic("app", "b")).unwrap();

        let names: Vec<String> = store
            .list(&NamespaceId::new("app"))
            .unwrap()
            .iter()
            .map(|m| m.topic_id().name().to_string())
            .collect();
        assert_eq!(names, vec!["a"]);

        assert_eq!(store.list_all().unwrap().len(), 2);
        assert_eq!(
            store.list_retired().unwrap(),
            vec![(topic("app", "b"), 1)]
        );
    }
}
