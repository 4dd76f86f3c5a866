//! # courier-core
//!
//! The messaging core of Courier: a durable, ordered, transactionally-aware
//! publish/store/fetch message store over a pluggable ordered key-value
//! backend.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              MessagingService                │
//! │   topic CRUD · publish · store · fetch       │
//! │   finalize / abort / rollback                │
//! └───────┬──────────┬──────────┬────────────────┘
//!         │          │          │
//!   MetadataStore MessageStore PayloadStore   TtlCleanupScheduler
//!         │          │          │                    │
//! ┌───────┴──────────┴──────────┴────────────────────┴──┐
//! │        StorageBackend (sled / in-memory)            │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Transaction visibility is delegated to a [`TransactionGate`] implemented
//! by the embedding transaction coordinator; the core never commits or
//! aborts transactions itself.

pub mod cleanup;
pub mod error;
pub mod keys;
pub mod message_store;
pub mod metadata_store;
pub mod payload_store;
pub mod sequence;
pub mod service;
pub mod transaction;

mod codec;

pub use cleanup::{SweepStats, TtlCleanupScheduler};
pub use error::{CourierError, Result};
pub use message_store::{MessageScan, MessageStore};
pub use metadata_store::MetadataStore;
pub use payload_store::PayloadStore;
pub use sequence::SequenceAllocator;
pub use service::{FetchIterator, MessagingService};
pub use transaction::{OpenGate, TransactionGate};
