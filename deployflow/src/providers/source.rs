//! Source provider configuration.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A reference to a secret held by the secret store.
///
/// The secret value is resolved by the managed service at run time and is
/// never read by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "store", rename_all = "snake_case")]
pub enum SecretRef {
    /// A secret in the provider's secrets manager.
    SecretsManager {
        /// Secret name or ARN.
        secret_id: String,
        /// JSON key inside the secret, when the secret holds an object.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        json_field: Option<String>,
    },
}

impl SecretRef {
    /// References a whole secrets-manager secret.
    #[must_use]
    pub fn secrets_manager(secret_id: impl Into<String>) -> Self {
        Self::SecretsManager {
            secret_id: secret_id.into(),
            json_field: None,
        }
    }

    /// Returns the dynamic reference string the provider resolves at deploy time.
    #[must_use]
    pub fn dynamic_reference(&self) -> String {
        match self {
            Self::SecretsManager {
                secret_id,
                json_field,
            } => match json_field {
                Some(field) => format!("{{{{resolve:secretsmanager:{secret_id}:SecretString:{field}}}}}"),
                None => format!("{{{{resolve:secretsmanager:{secret_id}:SecretString}}}}"),
            },
        }
    }
}

impl Default for SecretRef {
    fn default() -> Self {
        Self::secrets_manager("github-token")
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SecretsManager { secret_id, .. } => write!(f, "secretsmanager:{secret_id}"),
        }
    }
}

/// How the source provider learns about new commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTrigger {
    /// A repository webhook starts the pipeline on push.
    #[default]
    Webhook,
    /// The pipeline service polls the repository.
    Poll,
    /// The pipeline only starts manually.
    None,
}

/// A hosted git repository watched by the pipeline's source action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceProvider {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repository: String,
    /// Branch to follow.
    pub branch: String,
    /// OAuth token used to read the repository.
    pub credential: SecretRef,
    /// Change detection mode.
    pub trigger: SourceTrigger,
}

impl Default for SourceProvider {
    fn default() -> Self {
        Self {
            owner: "timxitx".to_string(),
            repository: "aws-cdk-payslip-program".to_string(),
            branch: "master".to_string(),
            credential: SecretRef::default(),
            trigger: SourceTrigger::default(),
        }
    }
}

impl SourceProvider {
    /// Creates a provider for `owner/repository` on the `master` branch.
    #[must_use]
    pub fn github(owner: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repository: repository.into(),
            ..Self::default()
        }
    }

    /// Sets the branch.
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Sets the credential reference.
    #[must_use]
    pub fn with_credential(mut self, credential: SecretRef) -> Self {
        self.credential = credential;
        self
    }

    /// Returns `owner/repository`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repository)
    }

    /// Checks that the provider is addressable.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner, repository, branch or secret id is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("source.owner", &self.owner),
            ("source.repository", &self.repository),
            ("source.branch", &self.branch),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::invalid(field, "must not be empty"));
            }
        }
        let SecretRef::SecretsManager { secret_id, .. } = &self.credential;
        if secret_id.trim().is_empty() {
            return Err(ConfigError::invalid("source.credential.secret_id", "must not be empty"));
        }
        Ok(())
    }
}
