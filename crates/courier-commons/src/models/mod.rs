//! Domain models for topics, messages and store requests.

mod message;
mod store_request;
mod topic_metadata;

pub use message::{Message, MessageEntry, PayloadEntry};
pub use store_request::{RollbackRange, StoreRequest};
pub use topic_metadata::TopicMetadata;
