//! Stack configuration.
//!
//! Configuration is resolved from, in increasing precedence:
//! - Default values (the reference container delivery stack)
//! - A TOML or JSON file
//! - `DEPLOYFLOW_*` environment variables
//!
//! Every section is optional in the file; missing sections and fields fall
//! back to their defaults.

use crate::errors::ConfigError;
use crate::providers::{
    BuildEnvironment, ContainerRegistry, ContainerService, ImageBuildOptions, ManagedPolicy, NetworkConfig,
    SourceProvider,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

static ACCOUNT_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{12}$").expect("valid regex"));
static REGION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}(-gov)?-[a-z]+-\d$").expect("valid regex"));

/// Environment variable overriding the target account.
pub const ENV_ACCOUNT: &str = "DEPLOYFLOW_ACCOUNT";
/// Environment variable overriding the target region.
pub const ENV_REGION: &str = "DEPLOYFLOW_REGION";
/// Environment variable overriding the source branch.
pub const ENV_BRANCH: &str = "DEPLOYFLOW_BRANCH";

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StackConfig {
    /// Where the stack is deployed.
    #[serde(default)]
    pub environment: EnvironmentConfig,

    /// Virtual network.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Container registry.
    #[serde(default)]
    pub registry: ContainerRegistry,

    /// Source repository.
    #[serde(default)]
    pub source: SourceProvider,

    /// Build project.
    #[serde(default)]
    pub build: BuildConfig,

    /// Container service.
    #[serde(default)]
    pub service: ContainerService,

    /// Delivery pipeline.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Target account and region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Stack name.
    pub stack_name: String,
    /// 12-digit account id.
    pub account: String,
    /// Region code, e.g. `us-east-2`.
    pub region: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            stack_name: "AwsCdkPayslipProgramStack".to_string(),
            account: "123456789012".to_string(),
            region: "us-east-2".to_string(),
        }
    }
}

/// Build project settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Project name.
    pub project_name: String,
    /// Build container.
    pub environment: BuildEnvironment,
    /// Policies attached to the project role.
    pub policies: Vec<ManagedPolicy>,
    /// Generated image build specification.
    pub image: ImageBuildOptions,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            project_name: "my-codepipeline".to_string(),
            environment: BuildEnvironment::default(),
            policies: vec![ManagedPolicy::ContainerRegistryPowerUser],
            image: ImageBuildOptions::default(),
        }
    }
}

/// Delivery pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Pipeline name.
    pub name: String,
    /// Deployment timeout in minutes for the deploy action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_timeout_minutes: Option<u32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "my_pipeline".to_string(),
            deploy_timeout_minutes: None,
        }
    }
}

impl StackConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns a `Parse` error if the document is malformed.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Self::parse_toml(text, "<inline>")
    }

    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns a `Parse` error if the document is malformed.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Self::parse_json(text, "<inline>")
    }

    /// Loads a config file, picking the format from its extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, has an unsupported
    /// extension or does not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let parse: fn(&str, &str) -> Result<Self, ConfigError> = match extension.as_deref() {
            Some("toml") => Self::parse_toml,
            Some("json") => Self::parse_json,
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    path: path.to_path_buf(),
                })
            }
        };

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = parse(&text, &path.display().to_string())?;
        info!(path = %path.display(), stack = %config.environment.stack_name, "Loaded stack configuration");
        Ok(config)
    }

    /// Applies `DEPLOYFLOW_*` environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Applies overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(account) = lookup(ENV_ACCOUNT) {
            debug!(variable = ENV_ACCOUNT, "Overriding account");
            self.environment.account = account;
        }
        if let Some(region) = lookup(ENV_REGION) {
            debug!(variable = ENV_REGION, %region, "Overriding region");
            self.environment.region = region;
        }
        if let Some(branch) = lookup(ENV_BRANCH) {
            debug!(variable = ENV_BRANCH, %branch, "Overriding source branch");
            self.source.branch = branch;
        }
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns a `Parse` error if a value has no TOML representation.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            origin: "<render>".to_string(),
            format: "toml",
            message: e.to_string(),
        })
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment.stack_name.trim().is_empty() {
            return Err(ConfigError::invalid("environment.stack_name", "must not be empty"));
        }
        if !ACCOUNT_ID.is_match(&self.environment.account) {
            return Err(ConfigError::invalid(
                "environment.account",
                format!("'{}' is not a 12-digit account id", self.environment.account),
            ));
        }
        if !REGION.is_match(&self.environment.region) {
            return Err(ConfigError::invalid(
                "environment.region",
                format!("'{}' is not a region code", self.environment.region),
            ));
        }
        self.network.validate()?;
        self.registry.validate()?;
        self.source.validate()?;
        self.service.validate()?;
        if self.build.image.manifest_file.trim().is_empty() {
            return Err(ConfigError::invalid("build.image.manifest_file", "must not be empty"));
        }
        if self.build.image.container_name != self.service.container.name {
            return Err(ConfigError::invalid(
                "build.image.container_name",
                format!(
                    "'{}' does not match service container '{}'; deployments would not find it",
                    self.build.image.container_name, self.service.container.name
                ),
            ));
        }
        Ok(())
    }

    fn parse_toml(text: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            origin: origin.to_string(),
            format: "toml",
            message: e.to_string(),
        })
    }

    fn parse_json(text: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse {
            origin: origin.to_string(),
            format: "json",
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = StackConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.name, "my_pipeline");
        assert_eq!(config.network.max_azs, 3);
        assert_eq!(config.source.branch, "master");
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config = StackConfig::from_toml_str(
            r#"
            [environment]
            region = "eu-west-1"

            [network]
            max_azs = 2

            [source]
            owner = "acme"
            repository = "shop"
            branch = "main"

            [build.image]
            working_directory = "app"
            "#,
        )
        .unwrap();

        assert_eq!(config.environment.region, "eu-west-1");
        assert_eq!(config.environment.stack_name, "AwsCdkPayslipProgramStack");
        assert_eq!(config.network.max_azs, 2);
        assert_eq!(config.source.full_name(), "acme/shop");
        assert_eq!(config.build.image.working_directory.as_deref(), Some("app"));
        assert_eq!(config.build.image.dockerfile, "docker/Dockerfile");
        assert_eq!(config.service, ContainerService::default());
    }

    #[test]
    fn test_json_and_toml_agree() {
        let original = StackConfig::default();
        let toml_text = original.to_toml_string().unwrap();
        let json_text = serde_json::to_string(&original).unwrap();

        assert_eq!(StackConfig::from_toml_str(&toml_text).unwrap(), original);
        assert_eq!(StackConfig::from_json_str(&json_text).unwrap(), original);
    }

    #[test]
    fn test_parse_error_names_format() {
        let err = StackConfig::from_toml_str("[network\nmax_azs = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { format: "toml", .. }));

        let err = StackConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { format: "json", .. }));
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let err = StackConfig::from_toml_str("[build]\npolicies = [\"administrator_access\"]").unwrap_err();
        assert!(err.to_string().contains("toml"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[pipeline]\nname = \"shop_delivery\"").unwrap();

        let config = StackConfig::load(file.path()).unwrap();
        assert_eq!(config.pipeline.name, "shop_delivery");
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"registry": {{"repository_name": "shop/web"}}}}"#).unwrap();

        let config = StackConfig::load(file.path()).unwrap();
        assert_eq!(config.registry.repository_name, "shop/web");
    }

    #[test]
    fn test_load_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = StackConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = StackConfig::load("/nonexistent/deployflow.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [(ENV_REGION, "eu-central-1"), (ENV_BRANCH, "release")].into();
        let mut config = StackConfig::default();
        config.apply_overrides_from(|key| vars.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.environment.region, "eu-central-1");
        assert_eq!(config.source.branch, "release");
        assert_eq!(config.environment.account, "123456789012");
    }

    #[test]
    fn test_environment_checks() {
        let mut config = StackConfig::default();
        config.environment.account = "12345".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("environment.account"));

        let mut config = StackConfig::default();
        config.environment.region = "Ohio".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("environment.region"));
    }

    #[test]
    fn test_container_name_must_match_manifest() {
        let mut config = StackConfig::default();
        config.service.container.name = "web".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("build.image.container_name"));
    }
}
