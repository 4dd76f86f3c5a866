//! # courier-commons
//!
//! Shared building blocks for the Courier messaging system: type-safe
//! identifiers, topic/message models, order-preserving key encoding and
//! configuration types.
//!
//! This crate stays dependency-light so that every other Courier crate can
//! depend on it without pulling in storage engines or async runtimes.

pub mod config;
pub mod errors;
pub mod ids;
pub mod models;
pub mod storage_key;

pub use config::MessagingConfig;
pub use errors::{CommonError, Result};
pub use ids::{MessageId, NamespaceId, TopicId};
pub use models::{Message, MessageEntry, PayloadEntry, RollbackRange, StoreRequest, TopicMetadata};
