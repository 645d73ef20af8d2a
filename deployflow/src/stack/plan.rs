//! The synthesized stack plan.

use crate::errors::DeployflowError;
use crate::pipeline::Pipeline;
use crate::providers::{BuildRunner, ContainerRegistry, ContainerService, NetworkConfig};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Registry settings together with the resolved repository URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryPlan {
    /// Repository URI the build pushes to.
    pub uri: String,
    /// Repository settings.
    #[serde(flatten)]
    pub repository: ContainerRegistry,
}

/// Every resource the stack provisions besides the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanResources {
    /// Virtual network.
    pub network: NetworkConfig,
    /// Container registry.
    pub registry: RegistryPlan,
    /// Build project, including its generated specification.
    pub build_project: BuildRunner,
    /// Container service behind the load balancer.
    pub service: ContainerService,
}

/// An immutable description of a fully assembled stack.
///
/// `plan_id` and `synthesized_at` identify one synthesis run;
/// `pipeline_fingerprint` identifies the topology and is identical across
/// runs over the same configuration.
#[derive(Debug, Clone, Serialize)]
pub struct StackPlan {
    /// Unique id of this synthesis run.
    pub plan_id: Uuid,
    /// When the plan was produced.
    pub synthesized_at: DateTime<Utc>,
    /// Stack name.
    pub stack_name: String,
    /// Target account.
    pub account: String,
    /// Target region.
    pub region: String,
    /// SHA-256 of the pipeline topology.
    pub pipeline_fingerprint: String,
    /// The validated pipeline.
    pub pipeline: Pipeline,
    /// Supporting resources.
    pub resources: PlanResources,
}

impl StackPlan {
    /// Renders the plan as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns a `Serialization` error if rendering fails.
    pub fn to_json_pretty(&self) -> Result<String, DeployflowError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Renders the plan as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns a `Serialization` error if rendering fails.
    pub fn to_value(&self) -> Result<serde_json::Value, DeployflowError> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::StackConfig;
    use crate::stack::DeliveryStack;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plan_shape() {
        let plan = DeliveryStack::assemble(&StackConfig::default()).unwrap().synthesize();
        let value = plan.to_value().unwrap();

        assert_eq!(value["stack_name"], "AwsCdkPayslipProgramStack");
        assert_eq!(value["pipeline"]["name"], "my_pipeline");
        assert_eq!(value["pipeline"]["stages"][1]["actions"][0]["capability"]["kind"], "build");
        assert_eq!(
            value["resources"]["registry"]["uri"],
            "123456789012.dkr.ecr.us-east-2.amazonaws.com/monthly-payslip-with-cdk"
        );
        assert_eq!(value["resources"]["registry"]["repository_name"], "monthly-payslip-with-cdk");
        assert_eq!(value["resources"]["build_project"]["project_name"], "my-codepipeline");
        assert_eq!(value["resources"]["network"]["max_azs"], 3);
    }

    #[test]
    fn test_fingerprint_stable_across_runs() {
        let stack = DeliveryStack::assemble(&StackConfig::default()).unwrap();
        let first = stack.synthesize();
        let second = stack.synthesize();

        assert_ne!(first.plan_id, second.plan_id);
        assert_eq!(first.pipeline_fingerprint, second.pipeline_fingerprint);

        let mut config = StackConfig::default();
        config.source.branch = "release".to_string();
        let other = DeliveryStack::assemble(&config).unwrap().synthesize();
        assert_ne!(first.pipeline_fingerprint, other.pipeline_fingerprint);
    }

    #[test]
    fn test_json_rendering() {
        let plan = DeliveryStack::assemble(&StackConfig::default()).unwrap().synthesize();
        let text = plan.to_json_pretty().unwrap();
        assert!(text.contains("\"pipeline_fingerprint\""));
        assert!(text.contains("EcsDeployAction"));
    }
}
