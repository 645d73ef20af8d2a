//! Build runner configuration and build specifications.
//!
//! The build specification is opaque to the pipeline: it is serialized into
//! the runner's schema and forwarded unmodified. The types here only make
//! sure it is well formed before it leaves the crate.

use super::ManagedPolicy;
use crate::errors::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static PROJECT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{1,254}$").expect("valid regex"));

/// Curated build images offered by the build runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildImage {
    /// Ubuntu 18.04 standard image, version 2.0.
    #[default]
    Standard2_0,
    /// Ubuntu 20.04 standard image, version 5.0.
    Standard5_0,
    /// Ubuntu 22.04 standard image, version 7.0.
    Standard7_0,
    /// Amazon Linux 2 standard image, version 5.0.
    AmazonLinux2_5,
}

impl BuildImage {
    /// Returns the image identifier the runner expects.
    #[must_use]
    pub const fn image_id(self) -> &'static str {
        match self {
            Self::Standard2_0 => "aws/codebuild/standard:2.0",
            Self::Standard5_0 => "aws/codebuild/standard:5.0",
            Self::Standard7_0 => "aws/codebuild/standard:7.0",
            Self::AmazonLinux2_5 => "aws/codebuild/amazonlinux2-x86_64-standard:5.0",
        }
    }
}

/// The container the build runs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildEnvironment {
    /// Build image.
    pub image: BuildImage,
    /// Runs the build container privileged. Required to run a docker daemon.
    pub privileged: bool,
}

impl Default for BuildEnvironment {
    fn default() -> Self {
        Self {
            image: BuildImage::default(),
            privileged: true,
        }
    }
}

/// One phase of a build specification.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildPhase {
    /// Commands run in order; the phase fails on the first failing command.
    #[serde(default)]
    pub commands: Vec<String>,
    /// Commands run after `commands`, whether they succeeded or not.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finally: Vec<String>,
}

impl BuildPhase {
    /// Creates a phase from a list of commands.
    #[must_use]
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
            finally: Vec::new(),
        }
    }

    /// Sets the `finally` block.
    #[must_use]
    pub fn with_finally<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.finally = commands.into_iter().map(Into::into).collect();
        self
    }

    fn all_commands(&self) -> impl Iterator<Item = &String> {
        self.commands.iter().chain(self.finally.iter())
    }
}

/// The ordered build phases. Absent phases are skipped by the runner.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildPhases {
    /// Dependency installation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<BuildPhase>,
    /// Preparation such as registry login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_build: Option<BuildPhase>,
    /// The build itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildPhase>,
    /// Publishing and manifest generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_build: Option<BuildPhase>,
}

impl BuildPhases {
    /// Iterates the present phases in execution order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &BuildPhase)> {
        [
            ("install", self.install.as_ref()),
            ("pre_build", self.pre_build.as_ref()),
            ("build", self.build.as_ref()),
            ("post_build", self.post_build.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, phase)| phase.map(|p| (name, p)))
    }
}

/// Files the build hands to the next stage as its output artifact.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildArtifacts {
    /// File patterns, relative to the build root.
    #[serde(default)]
    pub files: Vec<String>,
}

/// A build specification in the runner's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSpec {
    /// Schema version.
    pub version: String,
    /// Build phases.
    #[serde(default)]
    pub phases: BuildPhases,
    /// Declared output files.
    #[serde(default)]
    pub artifacts: BuildArtifacts,
}

/// Knobs for the generated container image build specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageBuildOptions {
    /// Directory to `cd` into before building, relative to the source root.
    pub working_directory: Option<String>,
    /// Dockerfile path, relative to the working directory.
    pub dockerfile: String,
    /// Container name written into the deployment manifest.
    pub container_name: String,
    /// Deployment manifest file written in `post_build`.
    pub manifest_file: String,
    /// Extra files to declare as build output besides the manifest.
    pub extra_output_files: Vec<String>,
}

impl Default for ImageBuildOptions {
    fn default() -> Self {
        Self {
            working_directory: Some("monthly-payslip".to_string()),
            dockerfile: "docker/Dockerfile".to_string(),
            container_name: "monthly-payslip-with-cdk".to_string(),
            manifest_file: "imagedefinitions.json".to_string(),
            extra_output_files: Vec::new(),
        }
    }
}

impl BuildSpec {
    /// The schema version understood by the runner.
    pub const VERSION: &'static str = "0.2";

    /// Creates an empty specification.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: Self::VERSION.to_string(),
            phases: BuildPhases::default(),
            artifacts: BuildArtifacts::default(),
        }
    }

    /// Generates the container image build: log in to the registry, derive
    /// the image tag from the commit hash, build, tag, push and write the
    /// deployment manifest. Expects `ECR_REPO` in the build environment.
    #[must_use]
    pub fn container_image(options: &ImageBuildOptions) -> Self {
        let mut build = vec!["echo Build started on `date`".to_string()];
        if let Some(ref dir) = options.working_directory {
            build.push(format!("cd {dir}"));
        }
        build.extend([
            "echo Building Docker Image $ECR_REPO:latest".to_string(),
            format!("docker build -f {} -t $ECR_REPO:latest .", options.dockerfile),
            "echo Tagging Docker Image $ECR_REPO:latest with $ECR_REPO:$IMAGE_TAG".to_string(),
            "docker tag $ECR_REPO:latest $ECR_REPO:$IMAGE_TAG".to_string(),
        ]);

        // The manifest is written back at the source root so the declared
        // artifact paths stay relative to it.
        let manifest_target = match options.working_directory {
            Some(_) => format!("$CODEBUILD_SRC_DIR/{}", options.manifest_file),
            None => options.manifest_file.clone(),
        };

        let mut files = vec![options.manifest_file.clone()];
        files.extend(options.extra_output_files.iter().cloned());

        Self {
            version: Self::VERSION.to_string(),
            phases: BuildPhases {
                install: Some(
                    BuildPhase::new(["#apt-get update -y"]).with_finally(["echo Done installing deps"]),
                ),
                pre_build: Some(BuildPhase::new([
                    "echo Logging in to Amazon ECR...",
                    "$(aws ecr get-login --no-include-email)",
                    "COMMIT_HASH=$(echo $CODEBUILD_RESOLVED_SOURCE_VERSION | cut -c 1-7)",
                    "IMAGE_TAG=${COMMIT_HASH:=latest}",
                ])),
                build: Some(BuildPhase::new(build).with_finally(["echo Done building code"])),
                post_build: Some(BuildPhase::new([
                    "echo Pushing Docker Image to $ECR_REPO:latest and $ECR_REPO:$IMAGE_TAG".to_string(),
                    "docker push $ECR_REPO:latest".to_string(),
                    "docker push $ECR_REPO:$IMAGE_TAG".to_string(),
                    format!(
                        "printf '[{{\"name\":\"%s\",\"imageUri\":\"%s\"}}]' {} $ECR_REPO:$IMAGE_TAG > {manifest_target}",
                        options.container_name
                    ),
                ])),
            },
            artifacts: BuildArtifacts { files },
        }
    }

    /// Serializes to the runner's JSON schema.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!(self)
    }

    /// Returns true if any phase runs a docker command.
    #[must_use]
    pub fn uses_docker(&self) -> bool {
        self.phases
            .iter()
            .flat_map(|(_, phase)| phase.all_commands())
            .any(|cmd| cmd.trim_start().starts_with("docker "))
    }

    /// Returns true if `file` is among the declared output files.
    #[must_use]
    pub fn declares_output(&self, file: &str) -> bool {
        self.artifacts.files.iter().any(|f| f == file)
    }
}

impl Default for BuildSpec {
    fn default() -> Self {
        Self::new()
    }
}

/// A build project: environment, permissions and specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRunner {
    /// Project name.
    pub project_name: String,
    /// Build container.
    pub environment: BuildEnvironment,
    /// Plain-text environment variables visible to every phase.
    pub environment_variables: BTreeMap<String, String>,
    /// Policies attached to the project's service role.
    pub managed_policies: Vec<ManagedPolicy>,
    /// The build specification.
    pub build_spec: BuildSpec,
}

impl BuildRunner {
    /// Creates a project with the default environment and an empty specification.
    #[must_use]
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            environment: BuildEnvironment::default(),
            environment_variables: BTreeMap::new(),
            managed_policies: Vec::new(),
            build_spec: BuildSpec::new(),
        }
    }

    /// Sets the build environment.
    #[must_use]
    pub fn with_environment(mut self, environment: BuildEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// Adds an environment variable.
    #[must_use]
    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment_variables.insert(key.into(), value.into());
        self
    }

    /// Attaches a managed policy to the project role.
    #[must_use]
    pub fn with_policy(mut self, policy: ManagedPolicy) -> Self {
        if !self.managed_policies.contains(&policy) {
            self.managed_policies.push(policy);
        }
        self
    }

    /// Sets the build specification.
    #[must_use]
    pub fn with_build_spec(mut self, spec: BuildSpec) -> Self {
        self.build_spec = spec;
        self
    }

    /// Checks the project against the runner's constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if the project name is malformed, the specification
    /// has no version, or docker commands run without a privileged container.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !PROJECT_NAME.is_match(&self.project_name) {
            return Err(ConfigError::invalid(
                "build.project_name",
                format!(
                    "'{}' must be 2-255 characters of letters, digits, '-' and '_', starting with a letter or digit",
                    self.project_name
                ),
            ));
        }
        if self.build_spec.version.trim().is_empty() {
            return Err(ConfigError::invalid("build.build_spec.version", "must not be empty"));
        }
        if self.build_spec.uses_docker() && !self.environment.privileged {
            return Err(ConfigError::invalid(
                "build.environment.privileged",
                "docker commands need a privileged build container",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_container_image_spec_phases() {
        let spec = BuildSpec::container_image(&ImageBuildOptions::default());
        let names: Vec<_> = spec.phases.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["install", "pre_build", "build", "post_build"]);
        assert_eq!(spec.artifacts.files, vec!["imagedefinitions.json".to_string()]);
        assert!(spec.uses_docker());
    }

    #[test]
    fn test_container_image_spec_working_directory() {
        let spec = BuildSpec::container_image(&ImageBuildOptions::default());
        let build = spec.phases.build.as_ref().unwrap();
        assert_eq!(build.commands[1], "cd monthly-payslip");
        let post = spec.phases.post_build.as_ref().unwrap();
        assert!(post.commands[3].ends_with("> $CODEBUILD_SRC_DIR/imagedefinitions.json"));
    }

    #[test]
    fn test_container_image_spec_without_working_directory() {
        let options = ImageBuildOptions {
            working_directory: None,
            ..ImageBuildOptions::default()
        };
        let spec = BuildSpec::container_image(&options);
        let build = spec.phases.build.as_ref().unwrap();
        assert!(!build.commands.iter().any(|c| c.starts_with("cd ")));
        let post = spec.phases.post_build.as_ref().unwrap();
        assert!(post.commands[3].ends_with("> imagedefinitions.json"));
    }

    #[test]
    fn test_build_spec_schema_shape() {
        let value = BuildSpec::container_image(&ImageBuildOptions::default()).to_value();
        assert_eq!(value["version"], "0.2");
        assert_eq!(value["phases"]["pre_build"]["commands"][0], "echo Logging in to Amazon ECR...");
        assert_eq!(value["phases"]["install"]["finally"][0], "echo Done installing deps");
        assert!(value["phases"]["pre_build"].get("finally").is_none());
        assert_eq!(value["artifacts"]["files"][0], "imagedefinitions.json");
    }

    #[test]
    fn test_runner_validation() {
        let runner = BuildRunner::new("my-codepipeline")
            .with_build_spec(BuildSpec::container_image(&ImageBuildOptions::default()));
        assert!(runner.validate().is_ok());

        let bad_name = BuildRunner::new("-bad");
        assert!(bad_name.validate().is_err());
    }

    #[test]
    fn test_docker_requires_privileged() {
        let runner = BuildRunner::new("images")
            .with_environment(BuildEnvironment {
                image: BuildImage::Standard7_0,
                privileged: false,
            })
            .with_build_spec(BuildSpec::container_image(&ImageBuildOptions::default()));
        let err = runner.validate().unwrap_err();
        assert!(err.to_string().contains("privileged"));
    }

    #[test]
    fn test_policies_are_deduplicated() {
        let runner = BuildRunner::new("images")
            .with_policy(ManagedPolicy::ContainerRegistryPowerUser)
            .with_policy(ManagedPolicy::ContainerRegistryPowerUser);
        assert_eq!(runner.managed_policies.len(), 1);
    }
}
