//! Pipeline actions.

use super::{ActionKind, Artifact};
use crate::providers::{DeployTarget, SourceProvider};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The external capability an action invokes, with its configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Capability {
    /// Watch a repository and emit its contents on each commit.
    SourceFetch(SourceProvider),
    /// Run the named build project against the input artifacts.
    Build {
        /// Build project name.
        project: String,
    },
    /// Update a service to the image named in the input artifact.
    Deploy(DeployTarget),
}

impl Capability {
    /// Returns the kind of this capability.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::SourceFetch(_) => ActionKind::SourceFetch,
            Self::Build { .. } => ActionKind::Build,
            Self::Deploy(_) => ActionKind::Deploy,
        }
    }
}

/// A single unit of work inside a stage.
///
/// Every kind shares the same contract: a list of input artifacts that must
/// exist before the action's stage starts, and a list of output artifacts
/// that exist once the stage has completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Action name, unique within the pipeline.
    pub name: String,
    /// What the action does.
    pub capability: Capability,
    /// Artifacts consumed, in declaration order.
    #[serde(default)]
    pub inputs: Vec<Artifact>,
    /// Artifacts produced, in declaration order.
    #[serde(default)]
    pub outputs: Vec<Artifact>,
}

impl Action {
    /// Creates an action with no artifacts.
    #[must_use]
    pub fn new(name: impl Into<String>, capability: Capability) -> Self {
        Self {
            name: name.into(),
            capability,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Creates a source fetch action.
    #[must_use]
    pub fn source(name: impl Into<String>, provider: SourceProvider) -> Self {
        Self::new(name, Capability::SourceFetch(provider))
    }

    /// Creates a build action running `project`.
    #[must_use]
    pub fn build(name: impl Into<String>, project: impl Into<String>) -> Self {
        Self::new(
            name,
            Capability::Build {
                project: project.into(),
            },
        )
    }

    /// Creates a deploy action.
    #[must_use]
    pub fn deploy(name: impl Into<String>, target: DeployTarget) -> Self {
        Self::new(name, Capability::Deploy(target))
    }

    /// Declares an input artifact.
    #[must_use]
    pub fn with_input(mut self, artifact: impl Into<Artifact>) -> Self {
        self.add_input(artifact.into());
        self
    }

    /// Declares an output artifact.
    #[must_use]
    pub fn with_output(mut self, artifact: impl Into<Artifact>) -> Self {
        self.add_output(artifact.into());
        self
    }

    /// Returns the action kind.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        self.capability.kind()
    }

    /// Returns true if the action consumes `artifact`.
    #[must_use]
    pub fn consumes(&self, artifact: &str) -> bool {
        self.inputs.iter().any(|a| a.name() == artifact)
    }

    /// Returns true if the action produces `artifact`.
    #[must_use]
    pub fn produces(&self, artifact: &str) -> bool {
        self.outputs.iter().any(|a| a.name() == artifact)
    }

    /// Iterates the inputs in declaration order, skipping repeats.
    pub fn distinct_inputs(&self) -> impl Iterator<Item = &Artifact> {
        distinct(&self.inputs)
    }

    /// Iterates the outputs in declaration order, skipping repeats.
    pub fn distinct_outputs(&self) -> impl Iterator<Item = &Artifact> {
        distinct(&self.outputs)
    }

    pub(crate) fn add_input(&mut self, artifact: Artifact) {
        if !self.inputs.contains(&artifact) {
            self.inputs.push(artifact);
        }
    }

    pub(crate) fn add_output(&mut self, artifact: Artifact) {
        if !self.outputs.contains(&artifact) {
            self.outputs.push(artifact);
        }
    }
}

fn distinct(artifacts: &[Artifact]) -> impl Iterator<Item = &Artifact> {
    let mut seen = HashSet::new();
    artifacts.iter().filter(move |a| seen.insert(*a))
}
