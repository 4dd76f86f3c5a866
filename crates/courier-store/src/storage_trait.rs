//! Storage backend abstraction for pluggable storage implementations.
//!
//! The [`StorageBackend`] trait defines the ordered key-value operations the
//! messaging core needs:
//! - get/put/delete for key-value access
//! - batch for atomic multi-operation writes
//! - scan for ordered range queries
//! - delete_range for atomic, idempotent bulk removal
//! - partition management (maps to trees in sled, namespaces in memory)
//!
//! Backends must preserve byte-wise key order within a partition; the core's
//! key encoding relies on it for log ordering and range deletes.

use std::any::Any;
use std::fmt;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Lazy iterator over (key, value) pairs in key order.
pub type KvIterator<'a> = Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone)]
pub enum StorageError {
    /// Partition (tree, namespace) not found
    PartitionNotFound(String),

    /// Generic I/O error from underlying storage
    IoError(String),

    /// Other errors
    Other(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::PartitionNotFound(p) => write!(f, "Partition not found: {}", p),
            StorageError::IoError(msg) => write!(f, "I/O error: {}", msg),
            StorageError::Other(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// Represents a logical partition of data within a storage backend.
///
/// Different backends map partitions to their native concepts:
/// - sled: Tree
/// - in-memory: BTreeMap namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Partition {
    name: String,
}

impl Partition {
    /// Creates a new partition with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the partition name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<String> for Partition {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&str> for Partition {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A single operation in an atomic batch.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Insert or update a key-value pair
    Put {
        partition: Partition,
        key: Vec<u8>,
        value: Vec<u8>,
    },

    /// Delete a key
    Delete { partition: Partition, key: Vec<u8> },
}

/// Trait for pluggable ordered key-value backends.
///
/// Implementations must be thread-safe (Send + Sync) to allow concurrent
/// access. Within a partition, keys are ordered by raw byte comparison.
///
/// ## Error handling
///
/// Implementations should return `PartitionNotFound` when operating on a
/// partition that was never created, and `IoError` for engine failures.
/// `delete` and `delete_range` are idempotent: removing absent keys is not
/// an error.
pub trait StorageBackend: Send + Sync {
    /// Retrieves a value by key from the specified partition.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    fn get(&self, partition: &Partition, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Stores a key-value pair in the specified partition.
    ///
    /// If the key already exists, its value is updated.
    fn put(&self, partition: &Partition, key: &[u8], value: &[u8]) -> Result<()>;

    /// Deletes a key from the specified partition (idempotent).
    fn delete(&self, partition: &Partition, key: &[u8]) -> Result<()>;

    /// Executes multiple operations atomically.
    ///
    /// Operations targeting a single partition are all-or-nothing. Backends
    /// whose engines cannot batch across partitions apply one atomic batch
    /// per partition, in operation order.
    fn batch(&self, operations: Vec<Operation>) -> Result<()>;

    /// Scans keys in a partition in ascending key order.
    ///
    /// ## Parameters
    /// - `prefix`: if Some, only yield keys starting with this prefix
    /// - `start_key`: if Some, start scanning from this key (inclusive);
    ///   must be >= prefix if both are set
    /// - `limit`: if Some, yield at most this many entries
    fn scan(
        &self,
        partition: &Partition,
        prefix: Option<&[u8]>,
        start_key: Option<&[u8]>,
        limit: Option<usize>,
    ) -> Result<KvIterator<'_>>;

    /// Returns the last (key, value) pair in `[from, to]`, if any.
    ///
    /// Used to recover the highest persisted log position without walking
    /// the whole range.
    fn last_in_range(
        &self,
        partition: &Partition,
        from: &[u8],
        to: &[u8],
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>>;

    /// Atomically deletes every key in the inclusive range `[from, to]`,
    /// returning the number of keys removed.
    ///
    /// Idempotent: deleting an already-empty range returns `Ok(0)`.
    fn delete_range(&self, partition: &Partition, from: &[u8], to: &[u8]) -> Result<usize>;

    /// Checks if a partition exists.
    fn partition_exists(&self, partition: &Partition) -> bool;

    /// Creates a new partition.
    ///
    /// Returns `Ok(())` if the partition already exists (idempotent).
    fn create_partition(&self, partition: &Partition) -> Result<()>;

    /// Lists all partitions in the storage backend.
    fn list_partitions(&self) -> Result<Vec<Partition>>;

    /// Deletes a partition and all its data.
    fn drop_partition(&self, partition: &Partition) -> Result<()>;

    /// Downcast support for integration paths that need a concrete backend.
    ///
    /// Use sparingly; prefer the trait methods above.
    fn as_any(&self) -> &dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_creation() {
        let p1 = Partition::new("messages");
        assert_eq!(p1.name(), "messages");

        let p2 = Partition::from("metadata");
        assert_eq!(p2.name(), "metadata");
    }

    #[test]
    fn test_operation_construction() {
        let op = Operation::Put {
            partition: Partition::new("test"),
            key: b"key1".to_vec(),
            value: b"value1".to_vec(),
        };

        match op {
            Operation::Put {
                partition,
                key,
                value,
            } => {
                assert_eq!(partition.name(), "test");
                assert_eq!(key, b"key1");
                assert_eq!(value, b"value1");
            }
            _ => panic!("Wrong operation type"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = StorageError::PartitionNotFound("messages".to_string());
        assert_eq!(err.to_string(), "Partition not found: messages");

        let err = StorageError::IoError("disk full".to_string());
        assert_eq!(err.to_string(), "I/O error: disk full");
    }
}
