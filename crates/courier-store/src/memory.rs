//! In-memory storage backend.
//!
//! A `BTreeMap` per partition behind a `parking_lot::RwLock`. Serves as the
//! reference implementation of [`StorageBackend`] semantics and as the
//! backend of choice for tests and embedded usage. Scans collect the
//! matching entries under the read lock, so iterators observe a consistent
//! snapshot of the partition as of when the scan began.

use crate::storage_trait::{
    KvIterator, Operation, Partition, Result, StorageBackend, StorageError,
};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound::Included;

type PartitionData = BTreeMap<Vec<u8>, Vec<u8>>;

/// Thread-safe in-memory implementation of [`StorageBackend`].
#[derive(Default)]
pub struct InMemoryBackend {
    partitions: RwLock<HashMap<String, PartitionData>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_partition<T>(
        &self,
        partition: &Partition,
        f: impl FnOnce(&PartitionData) -> T,
    ) -> Result<T> {
        let guard = self.partitions.read();
        let data = guard
            .get(partition.name())
            .ok_or_else(|| StorageError::PartitionNotFound(partition.name().to_string()))?;
        Ok(f(data))
    }

    fn with_partition_mut<T>(
        &self,
        partition: &Partition,
        f: impl FnOnce(&mut PartitionData) -> T,
    ) -> Result<T> {
        let mut guard = self.partitions.write();
        let data = guard
            .get_mut(partition.name())
            .ok_or_else(|| StorageError::PartitionNotFound(partition.name().to_string()))?;
        Ok(f(data))
    }
}

impl StorageBackend for InMemoryBackend {
    fn get(&self, partition: &Partition, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.with_partition(partition, |data| data.get(key).cloned())
    }

    fn put(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<()> {
        self.with_partition_mut(partition, |data| {
            data.insert(key.to_vec(), value.to_vec());
        })
    }

    fn delete(&self, partition: &Partition, key: &[u8]) -> Result<()> {
        self.with_partition_mut(partition, |data| {
            data.remove(key);
        })
    }

    fn batch(&self, operations: Vec<Operation>) -> Result<()> {
        let mut guard = self.partitions.write();
        // Validate all target partitions before mutating anything.
        for op in &operations {
            let partition = match op {
                Operation::Put { partition, .. } => partition,
                Operation::Delete { partition, .. } => partition,
            };
            if !guard.contains_key(partition.name()) {
                return Err(StorageError::PartitionNotFound(
                    partition.name().to_string(),
                ));
            }
        }
        for op in operations {
            match op {
                Operation::Put {
                    partition,
                    key,
                    value,
                } => {
                    guard
                        .get_mut(partition.name())
                        .map(|data| data.insert(key, value));
                }
                Operation::Delete { partition, key } => {
                    guard.get_mut(partition.name()).map(|data| data.remove(&key));
                }
            }
        }
        Ok(())
    }

    fn scan(
        &self,
        partition: &Partition,
        prefix: Option<&[u8]>,
        start_key: Option<&[u8]>,
        limit: Option<usize>,
    ) -> Result<KvIterator<'_>> {
        let entries = self.with_partition(partition, |data| {
            let start = start_key.or(prefix).unwrap_or(&[]);
            let mut results = Vec::new();
            for (key, value) in data.range(start.to_vec()..) {
                if let Some(prefix) = prefix {
                    if !key.starts_with(prefix) {
                        break;
                    }
                }
                results.push((key.clone(), value.clone()));
                if let Some(limit) = limit {
                    if results.len() >= limit {
                        break;
                    }
                }
            }
            results
        })?;
        Ok(Box::new(entries.into_iter()))
    }

    fn last_in_range(
        &self,
        partition: &Partition,
        from: &[u8],
        to: &[u8],
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        self.with_partition(partition, |data| {
            data.range((Included(from.to_vec()), Included(to.to_vec())))
                .next_back()
                .map(|(k, v)| (k.clone(), v.clone()))
        })
    }

    fn delete_range(&self, partition: &Partition, from: &[u8], to: &[u8]) -> Result<usize> {
        self.with_partition_mut(partition, |data| {
            let keys: Vec<Vec<u8>> = data
                .range((Included(from.to_vec()), Included(to.to_vec())))
                .map(|(k, _)| k.clone())
                .collect();
            for key in &keys {
                data.remove(key);
            }
            keys.len()
        })
    }

    fn partition_exists(&self, partition: &Partition) -> bool {
        self.partitions.read().contains_key(partition.name())
    }

    fn create_partition(&self, partition: &Partition) -> Result<()> {
        self.partitions
            .write()
            .entry(partition.name().to_string())
            .or_default();
        Ok(())
    }

    fn list_partitions(&self) -> Result<Vec<Partition>> {
        Ok(self
            .partitions
            .read()
            .keys()
            .map(Partition::new)
            .collect())
    }

    fn drop_partition(&self, partition: &Partition) -> Result<()> {
        self.partitions.write().remove(partition.name());
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
