//! Topic metadata: generation counter and property map.

use crate::errors::{CommonError, Result};
use crate::ids::TopicId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata of a live topic.
///
/// The `generation` distinguishes successive lifetimes of the same topic
/// name: it increases on every create/recreate and is never reused, so a
/// recreated topic starts a fresh log isolated from its predecessor's data.
/// Properties are free-form string pairs; the TTL is carried under
/// [`TopicMetadata::TTL_KEY`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicMetadata {
    topic_id: TopicId,
    generation: i32,
    properties: HashMap<String, String>,
}

impl TopicMetadata {
    /// Property key carrying the retention window in seconds.
    pub const TTL_KEY: &'static str = "ttl";

    pub fn new(topic_id: TopicId, generation: i32, properties: HashMap<String, String>) -> Self {
        Self {
            topic_id,
            generation,
            properties,
        }
    }

    pub fn topic_id(&self) -> &TopicId {
        &self.topic_id
    }

    pub fn generation(&self) -> i32 {
        self.generation
    }

    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }

    /// Returns the TTL in seconds, if the property is present and parses.
    pub fn ttl_seconds(&self) -> Option<i64> {
        self.properties
            .get(Self::TTL_KEY)
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|ttl| *ttl >= 0)
    }

    /// Validates the property map.
    ///
    /// The TTL property, when present, must parse as a non-negative integer.
    pub fn validate(&self) -> Result<()> {
        if let Some(raw) = self.properties.get(Self::TTL_KEY) {
            match raw.parse::<i64>() {
                Ok(ttl) if ttl >= 0 => {}
                _ => {
                    return Err(CommonError::invalid_input(format!(
                        "property '{}' must be a non-negative integer, got '{}' for topic {}",
                        Self::TTL_KEY,
                        raw,
                        self.topic_id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::NamespaceId;

    fn topic() -> TopicId {
        TopicId::new(NamespaceId::new("app"), "events")
    }

    fn metadata(props: &[(&str, &str)]) -> TopicMetadata {
        let properties = props
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TopicMetadata::new(topic(), 1, properties)
    }

    #[test]
    fn test_ttl_parses() {
        let md = metadata(&[("ttl", "3600")]);
        assert_eq!(md.ttl_seconds(), Some(3600));
        assert!(md.validate().is_ok());
    }

    #[test]
    fn test_missing_ttl_is_none() {
        let md = metadata(&[]);
        assert_eq!(md.ttl_seconds(), None);
        assert!(md.validate().is_ok());
    }

    #[test]
    fn test_non_numeric_ttl_rejected() {
        let md = metadata(&[("ttl", "xyz")]);
        assert_eq!(md.ttl_seconds(), None);
        assert!(matches!(
            md.validate(),
            Err(CommonError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_negative_ttl_rejected() {
        let md = metadata(&[("ttl", "-5")]);
        assert!(md.validate().is_err());
    }
}
