//! Single-pass artifact hand-off validation.
//!
//! Stages run strictly in order and an action's outputs only exist once its
//! stage has completed, so the pass walks stages in declared order with the
//! set of artifacts available so far. Each stage checks its inputs against
//! that set before its own outputs are added to it.

use super::StageSpec;
use crate::core::Artifact;
use crate::errors::{NameKind, TopologyError, ValidationFailure};
use crate::utils::is_valid_name;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Validates a topology and returns every structural error, in stage order.
pub(crate) fn validate_topology(pipeline: &str, stages: &[StageSpec]) -> Result<(), ValidationFailure> {
    let mut errors = Vec::new();

    if !is_valid_name(pipeline) {
        errors.push(TopologyError::InvalidName {
            kind: NameKind::Pipeline,
            name: pipeline.to_string(),
        });
    }
    if stages.is_empty() {
        errors.push(TopologyError::EmptyPipeline {
            pipeline: pipeline.to_string(),
        });
    }

    // Producing stage of every artifact, for pointing at late producers.
    let mut produced_in: HashMap<&str, &str> = HashMap::new();
    for stage in stages {
        for action in &stage.actions {
            for artifact in action.distinct_outputs() {
                produced_in.entry(artifact.name()).or_insert(&stage.name);
            }
        }
    }

    // artifact -> producing action, for artifacts of completed stages
    let mut available: HashMap<&Artifact, &str> = HashMap::new();
    // artifact -> first consuming action
    let mut consumed_by: HashMap<&Artifact, &str> = HashMap::new();

    for (index, stage) in stages.iter().enumerate() {
        errors.extend(stage.validate());

        for action in &stage.actions {
            let kind = action.kind();
            if (index == 0) != kind.is_source() {
                errors.push(TopologyError::MisplacedSource {
                    action: action.name.clone(),
                    kind,
                    stage: stage.name.clone(),
                    stage_index: index,
                });
            }

            for input in action.distinct_inputs() {
                if !available.contains_key(input) {
                    errors.push(TopologyError::UnboundInput {
                        artifact: input.clone(),
                        action: action.name.clone(),
                        stage: stage.name.clone(),
                        produced_in: produced_in.get(input.name()).map(|s| (*s).to_string()),
                    });
                }
                match consumed_by.get(input) {
                    Some(first) => errors.push(TopologyError::MultipleConsumers {
                        artifact: input.clone(),
                        first_consumer: (*first).to_string(),
                        consumer: action.name.clone(),
                    }),
                    None => {
                        consumed_by.insert(input, &action.name);
                    }
                }
            }
        }

        for action in &stage.actions {
            for output in action.distinct_outputs() {
                match available.get(output) {
                    Some(first) => errors.push(TopologyError::DuplicateProducer {
                        artifact: output.clone(),
                        first_producer: (*first).to_string(),
                        producer: action.name.clone(),
                    }),
                    None => {
                        available.insert(output, &action.name);
                    }
                }
            }
        }

        debug!(
            pipeline = %pipeline,
            stage = %stage.name,
            available = available.len(),
            "Stage checked"
        );
    }

    if errors.is_empty() {
        debug!(pipeline = %pipeline, stages = stages.len(), "Pipeline topology is valid");
        Ok(())
    } else {
        warn!(pipeline = %pipeline, errors = errors.len(), "Pipeline topology is invalid");
        Err(ValidationFailure::new(pipeline, errors))
    }
}
