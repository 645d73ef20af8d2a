//! Container registry configuration.

use crate::errors::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static REPOSITORY_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-z0-9]+(?:[._-][a-z0-9]+)*/)*[a-z0-9]+(?:[._-][a-z0-9]+)*$").expect("valid regex")
});

/// Whether pushed tags may be overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagMutability {
    /// Tags such as `latest` can be moved to a new image.
    #[default]
    Mutable,
    /// A tag is bound to its first image forever.
    Immutable,
}

/// A container image repository addressed by a stable name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerRegistry {
    /// Repository name.
    pub repository_name: String,
    /// Scan images for vulnerabilities on push.
    pub scan_on_push: bool,
    /// Tag mutability.
    pub tag_mutability: TagMutability,
}

impl Default for ContainerRegistry {
    fn default() -> Self {
        Self::new("monthly-payslip-with-cdk")
    }
}

impl ContainerRegistry {
    /// Creates a repository with mutable tags and no scanning.
    #[must_use]
    pub fn new(repository_name: impl Into<String>) -> Self {
        Self {
            repository_name: repository_name.into(),
            scan_on_push: false,
            tag_mutability: TagMutability::default(),
        }
    }

    /// Returns the repository URI in `account`/`region`.
    #[must_use]
    pub fn uri(&self, account: &str, region: &str) -> String {
        format!("{account}.dkr.ecr.{region}.amazonaws.com/{}", self.repository_name)
    }

    /// Returns the URI for a tag, or the bare repository URI without one.
    #[must_use]
    pub fn uri_for_tag(&self, account: &str, region: &str, tag: Option<&str>) -> String {
        match tag {
            Some(tag) => format!("{}:{tag}", self.uri(account, region)),
            None => self.uri(account, region),
        }
    }

    /// Checks the repository name against the registry's naming rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not 2-256 lowercase characters made of
    /// `/`-separated components.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = &self.repository_name;
        if name.len() < 2 || name.len() > 256 || !REPOSITORY_NAME.is_match(name) {
            return Err(ConfigError::invalid(
                "registry.repository_name",
                format!("'{name}' is not a valid repository name"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_for_tag() {
        let registry = ContainerRegistry::new("shop/web");
        assert_eq!(
            registry.uri("123456789012", "us-east-2"),
            "123456789012.dkr.ecr.us-east-2.amazonaws.com/shop/web"
        );
        assert_eq!(
            registry.uri_for_tag("123456789012", "us-east-2", Some("latest")),
            "123456789012.dkr.ecr.us-east-2.amazonaws.com/shop/web:latest"
        );
    }

    #[test]
    fn test_repository_names() {
        assert!(ContainerRegistry::default().validate().is_ok());
        assert!(ContainerRegistry::new("team/app.v2_x").validate().is_ok());
        assert!(ContainerRegistry::new("Upper").validate().is_err());
        assert!(ContainerRegistry::new("trailing-").validate().is_err());
        assert!(ContainerRegistry::new("a").validate().is_err());
    }
}
