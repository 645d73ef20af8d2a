//! Pipeline builder.

use super::{validate::validate_topology, Pipeline, StageSpec};
use crate::core::{Action, Artifact};
use crate::errors::{TopologyError, ValidationFailure};
use crate::events::{event_types, EventSink, NoOpEventSink};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Builder for pipeline topologies.
///
/// The builder exclusively owns the topology while it is being defined;
/// [`PipelineBuilder::build`] freezes it into an immutable [`Pipeline`].
#[derive(Clone)]
pub struct PipelineBuilder {
    /// The pipeline name.
    name: String,
    /// Stages in execution order.
    stages: Vec<StageSpec>,
    /// Stage name -> position.
    stage_index: HashMap<String, usize>,
    /// Action name -> stage position.
    action_index: HashMap<String, usize>,
    /// Receives construction events.
    sink: Arc<dyn EventSink>,
}

impl fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("name", &self.name)
            .field("stages", &self.stages)
            .finish_non_exhaustive()
    }
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            stage_index: HashMap::new(),
            action_index: HashMap::new(),
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the sink that receives construction events.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Appends a stage to the pipeline.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateStageName` if a stage with this name exists, or
    /// `DuplicateActionName` if an action name is already taken.
    pub fn define_stage(mut self, name: impl Into<String>, actions: Vec<Action>) -> Result<Self, TopologyError> {
        self.add_stage(StageSpec::new(name, actions))?;
        Ok(self)
    }

    /// Appends a stage specification to the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage or one of its action names collides.
    pub fn add_stage(&mut self, spec: StageSpec) -> Result<(), TopologyError> {
        if self.stage_index.contains_key(&spec.name) {
            return Err(TopologyError::DuplicateStageName {
                pipeline: self.name.clone(),
                stage: spec.name,
            });
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for action in &spec.actions {
            if let Some(&existing) = self.action_index.get(&action.name) {
                return Err(TopologyError::DuplicateActionName {
                    action: action.name.clone(),
                    stage: spec.name.clone(),
                    existing_stage: self.stages[existing].name.clone(),
                });
            }
            if !seen.insert(action.name.as_str()) {
                return Err(TopologyError::DuplicateActionName {
                    action: action.name.clone(),
                    stage: spec.name.clone(),
                    existing_stage: spec.name.clone(),
                });
            }
        }

        let index = self.stages.len();
        for action in &spec.actions {
            self.action_index.insert(action.name.clone(), index);
        }
        self.stage_index.insert(spec.name.clone(), index);

        debug!(pipeline = %self.name, stage = %spec.name, index, actions = spec.actions.len(), "Stage defined");
        self.sink.emit(
            event_types::STAGE_DEFINED,
            Some(serde_json::json!({
                "pipeline": &self.name,
                "stage": &spec.name,
                "index": index,
                "actions": spec.actions.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
            })),
        );

        self.stages.push(spec);
        Ok(())
    }

    /// Connects `artifact` from `producer`'s outputs to `consumer`'s inputs.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAction` if either action is not defined, or
    /// `DanglingArtifact` unless the producer's stage comes strictly before
    /// the consumer's stage.
    pub fn connect_artifact(
        mut self,
        producer: &str,
        consumer: &str,
        artifact: impl Into<Artifact>,
    ) -> Result<Self, TopologyError> {
        self.add_connection(producer, consumer, artifact.into())?;
        Ok(self)
    }

    /// Connects an artifact between two actions in place.
    ///
    /// # Errors
    ///
    /// See [`PipelineBuilder::connect_artifact`].
    pub fn add_connection(&mut self, producer: &str, consumer: &str, artifact: Artifact) -> Result<(), TopologyError> {
        let producer_index = self.locate(producer)?;
        let consumer_index = self.locate(consumer)?;

        if producer_index >= consumer_index {
            return Err(TopologyError::DanglingArtifact {
                artifact,
                producer: producer.to_string(),
                producer_stage: self.stages[producer_index].name.clone(),
                producer_index,
                consumer: consumer.to_string(),
                consumer_stage: self.stages[consumer_index].name.clone(),
                consumer_index,
            });
        }

        if let Some(action) = self.stages[producer_index].action_mut(producer) {
            action.add_output(artifact.clone());
        }
        if let Some(action) = self.stages[consumer_index].action_mut(consumer) {
            action.add_input(artifact.clone());
        }

        debug!(pipeline = %self.name, %artifact, producer, consumer, "Artifact connected");
        self.sink.emit(
            event_types::ARTIFACT_CONNECTED,
            Some(serde_json::json!({
                "pipeline": &self.name,
                "artifact": artifact,
                "producer": producer,
                "consumer": consumer,
            })),
        );
        Ok(())
    }

    /// Validates the topology defined so far.
    ///
    /// # Errors
    ///
    /// Returns every structural error found.
    pub fn validate(&self) -> Result<(), ValidationFailure> {
        validate_topology(&self.name, &self.stages)
    }

    /// Freezes the topology.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline::new(self.name, self.stages)
    }

    /// Freezes the topology after validating it.
    ///
    /// # Errors
    ///
    /// Returns every structural error found.
    pub fn build_validated(self) -> Result<Pipeline, ValidationFailure> {
        let sink = Arc::clone(&self.sink);
        let pipeline = self.build();
        pipeline.validate_with(sink.as_ref())?;
        Ok(pipeline)
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    fn locate(&self, action: &str) -> Result<usize, TopologyError> {
        self.action_index
            .get(action)
            .copied()
            .ok_or_else(|| TopologyError::UnknownAction {
                pipeline: self.name.clone(),
                action: action.to_string(),
            })
    }
}
