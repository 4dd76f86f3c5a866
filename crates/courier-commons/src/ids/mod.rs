//! Type-safe identifier wrappers used throughout Courier.

mod message_id;
mod namespace_id;
mod topic_id;

pub use message_id::MessageId;
pub use namespace_id::NamespaceId;
pub use topic_id::TopicId;
