//! Provider-managed IAM policies that can be attached to roles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed set of provider-managed policies the stack knows how to attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagedPolicy {
    /// Push and pull access to container registries. Needed by the build
    /// runner to push images and by task execution roles to pull them.
    ContainerRegistryPowerUser,
    /// Pull-only access to container registries.
    ContainerRegistryReadOnly,
    /// Read/write access to build projects, without project deletion.
    CodeBuildDeveloperAccess,
    /// Lets the container platform pull images and ship task logs.
    TaskExecutionRole,
}

impl ManagedPolicy {
    /// Returns the provider's policy name, including any path prefix.
    #[must_use]
    pub const fn policy_name(self) -> &'static str {
        match self {
            Self::ContainerRegistryPowerUser => "AmazonEC2ContainerRegistryPowerUser",
            Self::ContainerRegistryReadOnly => "AmazonEC2ContainerRegistryReadOnly",
            Self::CodeBuildDeveloperAccess => "AWSCodeBuildDeveloperAccess",
            Self::TaskExecutionRole => "service-role/AmazonECSTaskExecutionRolePolicy",
        }
    }

    /// Returns the policy ARN.
    #[must_use]
    pub fn arn(self) -> String {
        format!("arn:aws:iam::aws:policy/{}", self.policy_name())
    }
}

impl fmt::Display for ManagedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.policy_name())
    }
}
