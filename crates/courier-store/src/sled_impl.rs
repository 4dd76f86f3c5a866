//! Sled-based storage backend.
//!
//! Partitions map to sled trees. Batches and range deletes use
//! `sled::Batch`, so they apply atomically within a tree; batches spanning
//! multiple partitions apply one atomic batch per tree, in operation order.

use crate::storage_trait::{
    KvIterator, Operation, Partition, Result, StorageBackend, StorageError,
};
use std::any::Any;
use std::collections::HashMap;
use std::path::Path;

// Name of the tree sled itself creates; never surfaced as a partition.
const SLED_DEFAULT_TREE: &[u8] = b"__sled__default";

/// Durable [`StorageBackend`] backed by an embedded sled database.
pub struct SledBackend {
    db: sled::Db,
}

impl SledBackend {
    /// Opens (or creates) a sled database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path).map_err(io_err)?;
        Ok(Self { db })
    }

    fn tree(&self, partition: &Partition) -> Result<sled::Tree> {
        if !self.partition_exists(partition) {
            return Err(StorageError::PartitionNotFound(
                partition.name().to_string(),
            ));
        }
        self.db.open_tree(partition.name()).map_err(io_err)
    }
}

fn io_err(e: sled::Error) -> StorageError {
    StorageError::IoError(e.to_string())
}

impl StorageBackend for SledBackend {
    fn get(&self, partition: &Partition, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let tree = self.tree(partition)?;
        Ok(tree.get(key).map_err(io_err)?.map(|v| v.to_vec()))
    }

    fn put(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<()> {
        let tree = self.tree(partition)?;
        tree.insert(key, value).map_err(io_err)?;
        Ok(())
    }

    fn delete(&self, partition: &Partition, key: &[u8]) -> Result<()> {
        let tree = self.tree(partition)?;
        tree.remove(key).map_err(io_err)?;
        Ok(())
    }

    fn batch(&self, operations: Vec<Operation>) -> Result<()> {
        // Group into one sled batch per partition so each tree gets a single
        // atomic apply. Partition order follows first appearance.
        let mut batches: HashMap<String, sled::Batch> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        for op in &operations {
            let partition = match op {
                Operation::Put { partition, .. } => partition,
                Operation::Delete { partition, .. } => partition,
            };
            if !self.partition_exists(partition) {
                return Err(StorageError::PartitionNotFound(
                    partition.name().to_string(),
                ));
            }
            if !batches.contains_key(partition.name()) {
                batches.insert(partition.name().to_string(), sled::Batch::default());
                order.push(partition.name().to_string());
            }
        }

        for op in operations {
            match op {
                Operation::Put {
                    partition,
                    key,
                    value,
                } => {
                    if let Some(batch) = batches.get_mut(partition.name()) {
                        batch.insert(key, value);
                    }
                }
                Operation::Delete { partition, key } => {
                    if let Some(batch) = batches.get_mut(partition.name()) {
                        batch.remove(key);
                    }
                }
            }
        }

        for name in order {
            let tree = self.db.open_tree(&name).map_err(io_err)?;
            if let Some(batch) = batches.remove(&name) {
                tree.apply_batch(batch).map_err(io_err)?;
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
        let tree = self.tree(partition)?;
        let start = start_key.or(prefix).unwrap_or(&[]).to_vec();
        let prefix = prefix.map(|p| p.to_vec());

        let iter = tree
            .range(start..)
            .filter_map(|item| match item {
                Ok((k, v)) => Some((k.to_vec(), v.to_vec())),
                Err(e) => {
                    log::warn!("sled scan error, stopping iteration: {}", e);
                    None
                }
            })
            .take_while(move |(k, _)| match &prefix {
                Some(p) => k.starts_with(p),
                None => true,
            });

        match limit {
            Some(n) => Ok(Box::new(iter.take(n))),
            None => Ok(Box::new(iter)),
        }
    }

    fn last_in_range(
        &self,
        partition: &Partition,
        from: &[u8],
        to: &[u8],
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let tree = self.tree(partition)?;
        match tree.range(from.to_vec()..=to.to_vec()).next_back() {
            Some(item) => {
                let (k, v) = item.map_err(io_err)?;
                Ok(Some((k.to_vec(), v.to_vec())))
            }
            None => Ok(None),
        }
    }

    fn delete_range(&self, partition: &Partition, from: &[u8], to: &[u8]) -> Result<usize> {
        let tree = self.tree(partition)?;
        let mut batch = sled::Batch::default();
        let mut count = 0usize;
        for item in tree.range(from.to_vec()..=to.to_vec()) {
            let (key, _) = item.map_err(io_err)?;
            batch.remove(key);
            count += 1;
        }
        if count > 0 {
            tree.apply_batch(batch).map_err(io_err)?;
        }
        Ok(count)
    }

    fn partition_exists(&self, partition: &Partition) -> bool {
        self.db
            .tree_names()
            .iter()
            .any(|name| name.as_ref() == partition.name().as_bytes())
    }

    fn create_partition(&self, partition: &Partition) -> Result<()> {
        self.db.open_tree(partition.name()).map_err(io_err)?;
        Ok(())
    }

    fn list_partitions(&self) -> Result<Vec<Partition>> {
        Ok(self
            .db
            .tree_names()
            .into_iter()
            .filter(|name| name.as_ref() != SLED_DEFAULT_TREE)
            .filter_map(|name| String::from_utf8(name.to_vec()).ok())
            .map(Partition::new)
            .collect())
    }

    fn drop_partition(&self, partition: &Partition) -> Result<()> {
        self.db.drop_tree(partition.name()).map_err(io_err)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
