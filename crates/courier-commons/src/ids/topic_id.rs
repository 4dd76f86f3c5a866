//! Type-safe wrapper for topic identifiers.

use crate::ids::NamespaceId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a topic: a (namespace, name) pair, globally unique per
/// namespace.
///
/// Topics are durable ordered message logs. The identifier is immutable;
/// recreating a topic under the same identifier starts a new generation
/// rather than reviving the old log.
///
/// # Examples
/// ```
/// use courier_commons::ids::{NamespaceId, TopicId};
///
/// let topic_id = TopicId::new(NamespaceId::new("app"), "notifications");
/// assert_eq!(topic_id.namespace().as_str(), "app");
/// assert_eq!(topic_id.name(), "notifications");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TopicId {
    namespace: NamespaceId,
    name: String,
}

impl TopicId {
    /// Creates a new TopicId.
    ///
    /// # Panics
    /// Panics if the topic name is empty or contains a NUL byte (NUL is
    /// reserved as the key-encoding separator).
    pub fn new(namespace: NamespaceId, name: impl Into<String>) -> Self {
        let name = name.into();
        assert!(!name.is_empty(), "topic name cannot be empty");
        assert!(!name.contains('\0'), "topic name cannot contain NUL");
        Self { namespace, name }
    }

    /// Returns the namespace this topic belongs to.
    pub fn namespace(&self) -> &NamespaceId {
        &self.namespace
    }

    /// Returns the topic name within its namespace.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}
