//! Deploy target configuration.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A reference to a running container service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceRef {
    /// Cluster the service runs in.
    pub cluster: String,
    /// Service name.
    pub service: String,
}

impl ServiceRef {
    /// Creates a service reference.
    #[must_use]
    pub fn new(cluster: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            service: service.into(),
        }
    }
}

impl fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.cluster, self.service)
    }
}

/// Rolls the image named in a build artifact's manifest out to a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployTarget {
    /// The service to update.
    pub service: ServiceRef,
    /// Manifest file inside the input artifact naming the image.
    pub manifest_file: String,
    /// Deployment timeout in minutes; the service default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_minutes: Option<u32>,
}

impl DeployTarget {
    /// Default manifest file name.
    pub const DEFAULT_MANIFEST: &'static str = "imagedefinitions.json";

    /// Creates a target reading the default manifest file.
    #[must_use]
    pub fn new(service: ServiceRef) -> Self {
        Self {
            service,
            manifest_file: Self::DEFAULT_MANIFEST.to_string(),
            timeout_minutes: None,
        }
    }

    /// Sets the manifest file name.
    #[must_use]
    pub fn with_manifest_file(mut self, file: impl Into<String>) -> Self {
        self.manifest_file = file.into();
        self
    }

    /// Sets the deployment timeout.
    #[must_use]
    pub fn with_timeout_minutes(mut self, minutes: u32) -> Self {
        self.timeout_minutes = Some(minutes);
        self
    }

    /// Checks the target against the deploy action's limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest file is blank or the timeout is
    /// outside 1-60 minutes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.manifest_file.trim().is_empty() {
            return Err(ConfigError::invalid("deploy.manifest_file", "must not be empty"));
        }
        if let Some(minutes) = self.timeout_minutes {
            if !(1..=60).contains(&minutes) {
                return Err(ConfigError::invalid(
                    "deploy.timeout_minutes",
                    format!("{minutes} is outside 1-60"),
                ));
            }
        }
        Ok(())
    }
}
