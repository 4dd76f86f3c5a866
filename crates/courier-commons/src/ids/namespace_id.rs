//! Type-safe wrapper for namespace identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type-safe wrapper for namespace identifiers.
///
/// Ensures namespace names cannot be accidentally used where topic names are
/// expected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NamespaceId(String);

impl NamespaceId {
    /// Creates a new NamespaceId from a string.
    ///
    /// # Panics
    /// Panics if the name is empty or contains a NUL byte (NUL is reserved as
    /// the key-encoding separator).
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        assert!(!name.is_empty(), "NamespaceId cannot be empty");
        assert!(!name.contains('\0'), "NamespaceId cannot contain NUL");
        Self(name)
    }

    /// Returns the namespace name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the inner String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NamespaceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NamespaceId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for NamespaceId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_id_creation() {
        let ns = NamespaceId::new("system");
        assert_eq!(ns.as_str(), "system");
        assert_eq!(ns.to_string(), "system");
    }

    #[test]
    #[should_panic(expected = "NamespaceId cannot be empty")]
    fn test_empty_namespace_panics() {
        let _ = NamespaceId::new("");
    }
}
