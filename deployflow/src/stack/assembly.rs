//! Assembly of the container delivery stack.

use super::plan::{PlanResources, RegistryPlan, StackPlan};
use crate::config::StackConfig;
use crate::core::Action;
use crate::errors::{ConfigError, DeployflowError};
use crate::events::{event_types, EventSink, NoOpEventSink};
use crate::pipeline::{Pipeline, PipelineBuilder};
use crate::providers::{BuildRunner, BuildSpec, ContainerRegistry, ContainerService, DeployTarget, NetworkConfig};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Stage holding the source action.
pub const SOURCE_STAGE: &str = "Source";
/// Stage holding the build action.
pub const BUILD_STAGE: &str = "Build";
/// Stage holding the deploy action.
pub const DEPLOY_STAGE: &str = "Deploy";

/// Source action name.
pub const SOURCE_ACTION: &str = "github_source";
/// Build action name.
pub const BUILD_ACTION: &str = "Build";
/// Deploy action name.
pub const DEPLOY_ACTION: &str = "EcsDeployAction";

/// Artifact carrying the fetched sources.
pub const SOURCE_ARTIFACT: &str = "source_output";
/// Artifact carrying the build output, including the deployment manifest.
pub const BUILD_ARTIFACT: &str = "build_output";

/// Environment variable through which the build learns the registry URI.
pub const REGISTRY_ENV_VAR: &str = "ECR_REPO";

/// A fully assembled and validated delivery stack.
#[derive(Debug, Clone)]
pub struct DeliveryStack {
    config: StackConfig,
    network: NetworkConfig,
    registry: ContainerRegistry,
    build: BuildRunner,
    service: ContainerService,
    pipeline: Pipeline,
}

impl DeliveryStack {
    /// Assembles the stack without emitting events.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error for invalid collaborator settings, a
    /// `Topology` error if the pipeline cannot be defined, or a `Validation`
    /// error listing every structural problem of the pipeline.
    pub fn assemble(config: &StackConfig) -> Result<Self, DeployflowError> {
        Self::assemble_with(config, Arc::new(NoOpEventSink))
    }

    /// Assembles the stack, reporting construction events to `sink`.
    ///
    /// Resources are created in dependency order: network, registry, build
    /// project (which needs the registry URI), service, and finally the
    /// pipeline wiring them together.
    ///
    /// # Errors
    ///
    /// See [`DeliveryStack::assemble`].
    pub fn assemble_with(config: &StackConfig, sink: Arc<dyn EventSink>) -> Result<Self, DeployflowError> {
        config.validate()?;
        let env = &config.environment;

        let network = config.network.clone();
        let registry = config.registry.clone();

        let build_spec = BuildSpec::container_image(&config.build.image);
        let build = config
            .build
            .policies
            .iter()
            .fold(BuildRunner::new(&config.build.project_name), |runner, policy| {
                runner.with_policy(*policy)
            })
            .with_environment(config.build.environment.clone())
            .with_env_var(REGISTRY_ENV_VAR, registry.uri_for_tag(&env.account, &env.region, None))
            .with_build_spec(build_spec);
        build.validate()?;

        let service = config.service.clone();

        let mut target =
            DeployTarget::new(service.service_ref()).with_manifest_file(&config.build.image.manifest_file);
        if let Some(minutes) = config.pipeline.deploy_timeout_minutes {
            target = target.with_timeout_minutes(minutes);
        }
        target.validate()?;
        if !build.build_spec.declares_output(&target.manifest_file) {
            return Err(ConfigError::invalid(
                "build.image.manifest_file",
                format!("'{}' is not declared as a build output", target.manifest_file),
            )
            .into());
        }

        let pipeline = PipelineBuilder::new(&config.pipeline.name)
            .with_event_sink(Arc::clone(&sink))
            .define_stage(SOURCE_STAGE, vec![Action::source(SOURCE_ACTION, config.source.clone())])?
            .define_stage(BUILD_STAGE, vec![Action::build(BUILD_ACTION, &build.project_name)])?
            .define_stage(DEPLOY_STAGE, vec![Action::deploy(DEPLOY_ACTION, target)])?
            .connect_artifact(SOURCE_ACTION, BUILD_ACTION, SOURCE_ARTIFACT)?
            .connect_artifact(BUILD_ACTION, DEPLOY_ACTION, BUILD_ARTIFACT)?
            .build_validated()?;

        info!(
            stack = %env.stack_name,
            pipeline = %pipeline.name(),
            fingerprint = %pipeline.fingerprint(),
            "Delivery stack assembled"
        );

        Ok(Self {
            config: config.clone(),
            network,
            registry,
            build,
            service,
            pipeline,
        })
    }

    /// Returns the configuration the stack was assembled from.
    #[must_use]
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Returns the network settings.
    #[must_use]
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Returns the container registry.
    #[must_use]
    pub fn registry(&self) -> &ContainerRegistry {
        &self.registry
    }

    /// Returns the build project.
    #[must_use]
    pub fn build_project(&self) -> &BuildRunner {
        &self.build
    }

    /// Returns the container service.
    #[must_use]
    pub fn service(&self) -> &ContainerService {
        &self.service
    }

    /// Returns the validated pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Produces the immutable plan for this stack.
    #[must_use]
    pub fn synthesize(&self) -> StackPlan {
        let env = &self.config.environment;
        StackPlan {
            plan_id: Uuid::new_v4(),
            synthesized_at: Utc::now(),
            stack_name: env.stack_name.clone(),
            account: env.account.clone(),
            region: env.region.clone(),
            pipeline_fingerprint: self.pipeline.fingerprint(),
            pipeline: self.pipeline.clone(),
            resources: PlanResources {
                network: self.network.clone(),
                registry: RegistryPlan {
                    uri: self.registry.uri(&env.account, &env.region),
                    repository: self.registry.clone(),
                },
                build_project: self.build.clone(),
                service: self.service.clone(),
            },
        }
    }

    /// Produces the plan and reports it to `sink`.
    #[must_use]
    pub fn synthesize_with(&self, sink: &dyn EventSink) -> StackPlan {
        let plan = self.synthesize();
        sink.emit(
            event_types::STACK_SYNTHESIZED,
            Some(serde_json::json!({
                "stack": &plan.stack_name,
                "plan_id": plan.plan_id,
                "pipeline_fingerprint": &plan.pipeline_fingerprint,
            })),
        );
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ActionKind, Artifact};
    use crate::events::CollectingEventSink;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_stack_assembles() {
        let stack = DeliveryStack::assemble(&StackConfig::default()).unwrap();
        let pipeline = stack.pipeline();

        assert_eq!(pipeline.name(), "my_pipeline");
        assert_eq!(pipeline.execution_order(), vec!["Source", "Build", "Deploy"]);
        let kinds: Vec<_> = pipeline.actions().map(Action::kind).collect();
        assert_eq!(kinds, vec![ActionKind::SourceFetch, ActionKind::Build, ActionKind::Deploy]);
        assert!(pipeline.validate().is_ok());
    }

    #[test]
    fn test_artifacts_flow_forward() {
        let stack = DeliveryStack::assemble(&StackConfig::default()).unwrap();
        let pipeline = stack.pipeline();

        let build = pipeline.action(BUILD_ACTION).unwrap();
        assert_eq!(build.inputs, vec![Artifact::new(SOURCE_ARTIFACT)]);
        assert_eq!(build.outputs, vec![Artifact::new(BUILD_ARTIFACT)]);
        assert!(pipeline.action(DEPLOY_ACTION).unwrap().consumes(BUILD_ARTIFACT));
    }

    #[test]
    fn test_build_receives_registry_uri() {
        let stack = DeliveryStack::assemble(&StackConfig::default()).unwrap();
        assert_eq!(
            stack.build_project().environment_variables.get(REGISTRY_ENV_VAR).map(String::as_str),
            Some("123456789012.dkr.ecr.us-east-2.amazonaws.com/monthly-payslip-with-cdk")
        );
    }

    #[test]
    fn test_invalid_collaborator_config_rejected() {
        let mut config = StackConfig::default();
        config.network.max_azs = 0;
        let err = DeliveryStack::assemble(&config).unwrap_err();
        assert!(matches!(err, DeployflowError::Config(_)));
    }

    #[test]
    fn test_invalid_pipeline_name_fails_validation() {
        let mut config = StackConfig::default();
        config.pipeline.name = "my pipeline".to_string();
        let err = DeliveryStack::assemble(&config).unwrap_err();
        match err {
            DeployflowError::Validation(failure) => {
                assert_eq!(failure.errors.len(), 1);
                assert_eq!(failure.errors[0].code(), "TOPOLOGY-012-INVALID_NAME");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_deploy_reads_manifest_the_build_declares() {
        let mut config = StackConfig::default();
        config.build.image.manifest_file = "image.json".to_string();
        let stack = DeliveryStack::assemble(&config).unwrap();

        assert!(stack.build_project().build_spec.declares_output("image.json"));
        match &stack.pipeline().action(DEPLOY_ACTION).unwrap().capability {
            crate::core::Capability::Deploy(target) => assert_eq!(target.manifest_file, "image.json"),
            other => panic!("unexpected capability: {other:?}"),
        }
    }

    #[test]
    fn test_empty_manifest_rejected() {
        let mut config = StackConfig::default();
        config.build.image.manifest_file = " ".to_string();
        assert!(matches!(
            DeliveryStack::assemble(&config).unwrap_err(),
            DeployflowError::Config(_)
        ));
    }

    #[test]
    fn test_deploy_timeout_forwarded() {
        let mut config = StackConfig::default();
        config.pipeline.deploy_timeout_minutes = Some(30);
        let stack = DeliveryStack::assemble(&config).unwrap();
        let deploy = stack.pipeline().action(DEPLOY_ACTION).unwrap();
        match &deploy.capability {
            crate::core::Capability::Deploy(target) => assert_eq!(target.timeout_minutes, Some(30)),
            other => panic!("unexpected capability: {other:?}"),
        }

        config.pipeline.deploy_timeout_minutes = Some(90);
        assert!(DeliveryStack::assemble(&config).is_err());
    }

    #[test]
    fn test_synthesize_emits_event() {
        let sink = Arc::new(CollectingEventSink::new());
        let stack = DeliveryStack::assemble_with(&StackConfig::default(), sink.clone()).unwrap();
        let plan = stack.synthesize_with(sink.as_ref());

        assert_eq!(
            sink.event_types(),
            vec![
                "pipeline.stage_defined",
                "pipeline.stage_defined",
                "pipeline.stage_defined",
                "pipeline.artifact_connected",
                "pipeline.artifact_connected",
                "pipeline.validated",
                "stack.synthesized",
            ]
        );
        assert_eq!(plan.pipeline_fingerprint, stack.pipeline().fingerprint());
    }
}
