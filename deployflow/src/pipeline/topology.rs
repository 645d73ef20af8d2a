//! Frozen pipeline topology.

use super::{validate::validate_topology, StageSpec};
use crate::core::{Action, Artifact};
use crate::errors::ValidationFailure;
use crate::events::{event_types, EventSink};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// An immutable, ordered sequence of stages.
///
/// Stage order is fixed at construction and is the only valid execution
/// order. A `Pipeline` is never mutated after [`PipelineBuilder::build`]
/// returns it, so it can be validated any number of times, from any thread.
///
/// [`PipelineBuilder::build`]: super::PipelineBuilder::build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pipeline {
    name: String,
    stages: Vec<StageSpec>,
}

impl Pipeline {
    pub(crate) fn new(name: String, stages: Vec<StageSpec>) -> Self {
        Self { name, stages }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn execution_order(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Returns the stage with the given name.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&StageSpec> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Returns the position of the stage with the given name.
    #[must_use]
    pub fn stage_index(&self, name: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.name == name)
    }

    /// Returns the action with the given name.
    #[must_use]
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions().find(|a| a.name == name)
    }

    /// Iterates all actions in execution order.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.stages.iter().flat_map(|s| s.actions.iter())
    }

    /// Returns every artifact that is produced or consumed.
    #[must_use]
    pub fn artifacts(&self) -> BTreeSet<&Artifact> {
        self.actions()
            .flat_map(|a| a.inputs.iter().chain(a.outputs.iter()))
            .collect()
    }

    /// Returns the first action producing `artifact`.
    #[must_use]
    pub fn producer_of(&self, artifact: &str) -> Option<&Action> {
        self.actions().find(|a| a.produces(artifact))
    }

    /// Returns the actions consuming `artifact`.
    #[must_use]
    pub fn consumers_of(&self, artifact: &str) -> Vec<&Action> {
        self.actions().filter(|a| a.consumes(artifact)).collect()
    }

    /// Validates the topology.
    ///
    /// This is a pure function of the frozen topology: repeated calls return
    /// the same result.
    ///
    /// # Errors
    ///
    /// Returns every structural error found, in stage order.
    pub fn validate(&self) -> Result<(), ValidationFailure> {
        validate_topology(&self.name, &self.stages)
    }

    /// Validates the topology and reports the outcome to `sink`.
    ///
    /// # Errors
    ///
    /// Returns every structural error found, in stage order.
    pub fn validate_with(&self, sink: &dyn EventSink) -> Result<(), ValidationFailure> {
        let result = self.validate();
        let errors = result.as_ref().err().map_or(0, |f| f.errors.len());
        sink.emit(
            event_types::PIPELINE_VALIDATED,
            Some(serde_json::json!({
                "pipeline": &self.name,
                "valid": result.is_ok(),
                "errors": errors,
            })),
        );
        result
    }

    /// Returns the hex SHA-256 of the canonical JSON form of the topology.
    ///
    /// Equal topologies have equal fingerprints; any change to a name,
    /// capability, artifact or ordering changes it.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        // Only owned strings, vectors and BTreeMaps below; cannot fail.
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&canonical))
    }
}
