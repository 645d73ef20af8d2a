//! Artifact handles passed between pipeline stages.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// An opaque, named handle to data produced by one action.
///
/// The crate never looks inside an artifact; it only tracks which action
/// produces it and which action consumes it. Two handles with the same name
/// refer to the same artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Artifact {
    name: String,
}

impl Artifact {
    /// Creates a new artifact handle.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the artifact name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl AsRef<str> for Artifact {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl Borrow<str> for Artifact {
    fn borrow(&self) -> &str {
        &self.name
    }
}

impl From<&str> for Artifact {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Artifact {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_artifact_identity_is_name() {
        let a = Artifact::new("source_output");
        let b: Artifact = "source_output".into();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "source_output");
    }

    #[test]
    fn test_lookup_by_str() {
        let mut set = HashSet::new();
        set.insert(Artifact::new("img"));
        assert!(set.contains("img"));
        assert!(!set.contains("src"));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&Artifact::new("img")).unwrap();
        assert_eq!(json, r#""img""#);
    }
}
