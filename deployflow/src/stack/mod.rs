//! Stack assembly and plan synthesis.
//!
//! A [`DeliveryStack`] wires the collaborator resources and the
//! Source → Build → Deploy pipeline together from a
//! [`StackConfig`](crate::config::StackConfig); [`DeliveryStack::synthesize`]
//! freezes the result into a serializable [`StackPlan`].

mod assembly;
mod plan;

pub use assembly::{
    DeliveryStack, BUILD_ACTION, BUILD_ARTIFACT, BUILD_STAGE, DEPLOY_ACTION, DEPLOY_STAGE, REGISTRY_ENV_VAR,
    SOURCE_ACTION, SOURCE_ARTIFACT, SOURCE_STAGE,
};
pub use plan::{PlanResources, RegistryPlan, StackPlan};
