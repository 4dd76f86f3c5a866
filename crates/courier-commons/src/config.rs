//! Messaging system configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the messaging core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// TTL applied to topics created without an explicit `ttl` property,
    /// in seconds.
    #[serde(default = "default_topic_ttl_seconds")]
    pub default_ttl_seconds: i64,

    /// Interval between TTL cleanup sweeps, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
}

impl MessagingConfig {
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_seconds)
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: default_topic_ttl_seconds(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
        }
    }
}

fn default_topic_ttl_seconds() -> i64 {
    86_400 // one day
}

fn default_cleanup_interval_seconds() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MessagingConfig::default();
        assert_eq!(config.default_ttl_seconds, 86_400);
        assert_eq!(config.cleanup_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let config: MessagingConfig =
            serde_json::from_str(r#"{"default_ttl_seconds": 5}"#).unwrap();
        assert_eq!(config.default_ttl_seconds, 5);
        assert_eq!(config.cleanup_interval_seconds, 60);
    }
}
