//! # courier-store
//!
//! Ordered key-value storage abstraction for the Courier messaging system.
//! This crate isolates all direct storage-engine interactions, allowing
//! `courier-core` to depend only on the [`StorageBackend`] trait and remain
//! free of engine-specific code.
//!
//! ## Architecture
//!
//! ```text
//! courier-core (messaging logic)
//!     ↓
//! courier-store (ordered K/V operations)
//!     ↓
//! sled / in-memory (storage engine)
//! ```
//!
//! ## Partition model
//!
//! Data is organized into named [`Partition`]s that backends map to their
//! native concepts: sled maps a partition to a tree, the in-memory backend
//! to a `BTreeMap` namespace. Keys within a partition are ordered by raw
//! byte comparison, which is what makes range scans and range deletes work.

pub mod memory;
pub mod sled_impl;
pub mod storage_trait;

pub use memory::InMemoryBackend;
pub use sled_impl::SledBackend;
pub use storage_trait::{KvIterator, Operation, Partition, StorageBackend, StorageError};
