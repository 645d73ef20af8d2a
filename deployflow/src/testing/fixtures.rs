//! Test fixtures for pipeline topologies.

use crate::core::Action;
use crate::pipeline::{Pipeline, PipelineBuilder};
use crate::providers::{DeployTarget, ServiceRef, SourceProvider};

/// Creates a source action producing `output`.
#[must_use]
pub fn source_action(name: &str, output: &str) -> Action {
    Action::source(name, SourceProvider::github("acme", "shop")).with_output(output)
}

/// Creates a build action with the given artifacts.
#[must_use]
pub fn build_action(name: &str, inputs: &[&str], outputs: &[&str]) -> Action {
    let action = inputs
        .iter()
        .fold(Action::build(name, "shop-images"), |action, input| action.with_input(*input));
    outputs.iter().fold(action, |action, output| action.with_output(*output))
}

/// Creates a deploy action consuming `inputs`.
#[must_use]
pub fn deploy_action(name: &str, inputs: &[&str]) -> Action {
    inputs.iter().fold(
        Action::deploy(name, DeployTarget::new(ServiceRef::new("shop-cluster", "web"))),
        |action, input| action.with_input(*input),
    )
}

/// Builds the canonical Source -> Build -> Deploy pipeline through artifact
/// connections, the way the stack assembler does.
///
/// # Panics
///
/// Panics if the fixture topology is rejected, which would be a bug.
#[must_use]
pub fn delivery_pipeline() -> Pipeline {
    PipelineBuilder::new("my_pipeline")
        .define_stage("Source", vec![source_action("github_source", "source_output")])
        .and_then(|b| b.define_stage("Build", vec![Action::build("Build", "shop-images")]))
        .and_then(|b| {
            b.define_stage(
                "Deploy",
                vec![Action::deploy(
                    "EcsDeployAction",
                    DeployTarget::new(ServiceRef::new("shop-cluster", "web")),
                )],
            )
        })
        .and_then(|b| b.connect_artifact("github_source", "Build", "source_output"))
        .and_then(|b| b.connect_artifact("Build", "EcsDeployAction", "build_output"))
        .map(PipelineBuilder::build)
        .expect("fixture pipeline is well formed")
}

/// Builds a pipeline of `width` parallel build/deploy chains, for benchmarks.
///
/// # Panics
///
/// Panics if the generated topology is rejected, which would be a bug.
#[must_use]
pub fn wide_pipeline(width: usize) -> Pipeline {
    let sources = (0..width).map(|i| source_action(&format!("fetch-{i}"), &format!("src-{i}"))).collect();
    let builds = (0..width)
        .map(|i| build_action(&format!("build-{i}"), &[format!("src-{i}").as_str()], &[format!("img-{i}").as_str()]))
        .collect();
    let deploys = (0..width)
        .map(|i| deploy_action(&format!("deploy-{i}"), &[format!("img-{i}").as_str()]))
        .collect();

    PipelineBuilder::new("wide")
        .define_stage("Source", sources)
        .and_then(|b| b.define_stage("Build", builds))
        .and_then(|b| b.define_stage("Deploy", deploys))
        .map(PipelineBuilder::build)
        .expect("generated pipeline is well formed")
}
