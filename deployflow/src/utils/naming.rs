//! Naming rules shared by pipelines, stages, actions and artifacts.

use regex::Regex;
use std::sync::LazyLock;

static SERVICE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9.@_-]{1,100}$").expect("valid regex"));

/// Returns true if `name` is accepted by the managed pipeline service for a
/// pipeline, stage, action or artifact.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    SERVICE_NAME.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_service_names() {
        for name in ["Source", "github_source", "my-pipeline", "v1.2@beta", "EcsDeployAction"] {
            assert!(is_valid_name(name), "{name} should be valid");
        }
    }

    #[test]
    fn test_rejects_bad_names() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("has space"));
        assert!(!is_valid_name("slash/name"));
        assert!(!is_valid_name(&"x".repeat(101)));
        assert!(is_valid_name(&"x".repeat(100)));
    }
}
