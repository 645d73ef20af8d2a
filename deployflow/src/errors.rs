//! Error types for deployflow.
//!
//! Every error here is a configuration-time error: the crate never executes
//! a pipeline, so build, deploy and credential failures belong to the managed
//! services and never surface through these types.

use crate::core::{ActionKind, Artifact, ArtifactDirection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for deployflow operations.
#[derive(Debug, Error)]
pub enum DeployflowError {
    /// A single structural error raised while building the topology.
    #[error("{0}")]
    Topology(#[from] TopologyError),

    /// The finished topology failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationFailure),

    /// A collaborator configuration value is invalid or could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A plan could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Metadata about a structural error for better diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "TOPOLOGY-003-UNBOUND_INPUT").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: BTreeMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Converts to a JSON object.
    #[must_use]
    pub fn to_dict(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert("code".to_string(), serde_json::json!(self.code));
        map.insert("summary".to_string(), serde_json::json!(self.summary));
        if let Some(ref hint) = self.fix_hint {
            map.insert("fix_hint".to_string(), serde_json::json!(hint));
        }
        if !self.context.is_empty() {
            map.insert("context".to_string(), serde_json::json!(self.context));
        }
        serde_json::Value::Object(map)
    }
}

/// What a name identifies, for `InvalidName` reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameKind {
    /// A pipeline name.
    Pipeline,
    /// A stage name.
    Stage,
    /// An action name.
    Action,
    /// An artifact name.
    Artifact,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pipeline => write!(f, "pipeline"),
            Self::Stage => write!(f, "stage"),
            Self::Action => write!(f, "action"),
            Self::Artifact => write!(f, "artifact"),
        }
    }
}

/// A structural error in a pipeline topology.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TopologyError {
    /// A stage name collides with an existing stage.
    #[error("Stage '{stage}' is already defined in pipeline '{pipeline}'")]
    DuplicateStageName {
        /// The pipeline name.
        pipeline: String,
        /// The colliding stage name.
        stage: String,
    },

    /// An artifact connection does not flow strictly forward.
    #[error(
        "Artifact '{artifact}' cannot flow from '{producer}' in stage '{producer_stage}' (#{producer_index}) \
         to '{consumer}' in stage '{consumer_stage}' (#{consumer_index})"
    )]
    DanglingArtifact {
        /// The artifact being connected.
        artifact: Artifact,
        /// The producing action.
        producer: String,
        /// The producing action's stage.
        producer_stage: String,
        /// Position of the producing stage.
        producer_index: usize,
        /// The consuming action.
        consumer: String,
        /// The consuming action's stage.
        consumer_stage: String,
        /// Position of the consuming stage.
        consumer_index: usize,
    },

    /// An action requires an artifact no earlier stage produces.
    #[error("Action '{action}' in stage '{stage}' requires artifact '{artifact}' which no earlier stage produces")]
    UnboundInput {
        /// The missing artifact.
        artifact: Artifact,
        /// The consuming action.
        action: String,
        /// The consuming action's stage.
        stage: String,
        /// Stage that produces the artifact too late, if any does.
        #[serde(skip_serializing_if = "Option::is_none")]
        produced_in: Option<String>,
    },

    /// An action name collides with an existing action.
    #[error("Action '{action}' in stage '{stage}' is already defined in stage '{existing_stage}'")]
    DuplicateActionName {
        /// The colliding action name.
        action: String,
        /// The stage being defined.
        stage: String,
        /// The stage that already holds the name.
        existing_stage: String,
    },

    /// A connection names an action that is not part of the pipeline.
    #[error("Action '{action}' is not defined in pipeline '{pipeline}'")]
    UnknownAction {
        /// The pipeline name.
        pipeline: String,
        /// The unknown action name.
        action: String,
    },

    /// Two actions produce the same artifact.
    #[error("Artifact '{artifact}' is produced by both '{first_producer}' and '{producer}'")]
    DuplicateProducer {
        /// The artifact.
        artifact: Artifact,
        /// The action that produced it first.
        first_producer: String,
        /// The second producer.
        producer: String,
    },

    /// Two actions consume the same artifact.
    #[error("Artifact '{artifact}' is consumed by both '{first_consumer}' and '{consumer}'")]
    MultipleConsumers {
        /// The artifact.
        artifact: Artifact,
        /// The action that consumed it first.
        first_consumer: String,
        /// The second consumer.
        consumer: String,
    },

    /// An action declares the wrong number of artifacts for its kind.
    #[error("{kind} action '{action}' declares {actual} {direction} artifact(s), expected {expected}")]
    ArityViolation {
        /// The action name.
        action: String,
        /// The action kind.
        kind: ActionKind,
        /// Inputs or outputs.
        direction: ArtifactDirection,
        /// Human readable bound.
        expected: String,
        /// Declared count.
        actual: usize,
    },

    /// The pipeline has no stages.
    #[error("Pipeline '{pipeline}' has no stages")]
    EmptyPipeline {
        /// The pipeline name.
        pipeline: String,
    },

    /// A stage has no actions.
    #[error("Stage '{stage}' has no actions")]
    EmptyStage {
        /// The stage name.
        stage: String,
    },

    /// A source action outside the first stage, or another kind inside it.
    #[error("{kind} action '{action}' cannot be placed in stage '{stage}' (#{stage_index})")]
    MisplacedSource {
        /// The action name.
        action: String,
        /// The action kind.
        kind: ActionKind,
        /// The stage name.
        stage: String,
        /// Position of the stage.
        stage_index: usize,
    },

    /// A name does not satisfy the managed service's naming rules.
    #[error("Invalid {kind} name '{name}': expected 1-100 characters of A-Z a-z 0-9 . @ - _")]
    InvalidName {
        /// What the name identifies.
        kind: NameKind,
        /// The offending name.
        name: String,
    },
}

impl TopologyError {
    /// Returns the stable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DuplicateStageName { .. } => "TOPOLOGY-001-DUPLICATE_STAGE",
            Self::DanglingArtifact { .. } => "TOPOLOGY-002-DANGLING_ARTIFACT",
            Self::UnboundInput { .. } => "TOPOLOGY-003-UNBOUND_INPUT",
            Self::DuplicateActionName { .. } => "TOPOLOGY-004-DUPLICATE_ACTION",
            Self::UnknownAction { .. } => "TOPOLOGY-005-UNKNOWN_ACTION",
            Self::DuplicateProducer { .. } => "TOPOLOGY-006-DUPLICATE_PRODUCER",
            Self::MultipleConsumers { .. } => "TOPOLOGY-007-MULTIPLE_CONSUMERS",
            Self::ArityViolation { .. } => "TOPOLOGY-008-ARITY",
            Self::EmptyPipeline { .. } => "TOPOLOGY-009-EMPTY_PIPELINE",
            Self::EmptyStage { .. } => "TOPOLOGY-010-EMPTY_STAGE",
            Self::MisplacedSource { .. } => "TOPOLOGY-011-MISPLACED_SOURCE",
            Self::InvalidName { .. } => "TOPOLOGY-012-INVALID_NAME",
        }
    }

    /// Returns the artifact the error is about, if any.
    #[must_use]
    pub const fn artifact(&self) -> Option<&Artifact> {
        match self {
            Self::DanglingArtifact { artifact, .. }
            | Self::UnboundInput { artifact, .. }
            | Self::DuplicateProducer { artifact, .. }
            | Self::MultipleConsumers { artifact, .. } => Some(artifact),
            _ => None,
        }
    }

    /// Builds diagnostic info with a fix hint and the offending identifiers.
    #[must_use]
    pub fn error_info(&self) -> ContractErrorInfo {
        let info = ContractErrorInfo::new(self.code(), self.to_string());
        match self {
            Self::DuplicateStageName { stage, .. } => info
                .with_context_entry("stage", stage)
                .with_fix_hint("Give every stage a unique name."),
            Self::DanglingArtifact {
                artifact,
                producer,
                consumer,
                ..
            } => info
                .with_context_entry("artifact", artifact)
                .with_context_entry("producer", producer)
                .with_context_entry("consumer", consumer)
                .with_fix_hint("Move the consumer to a stage after the producer's stage."),
            Self::UnboundInput {
                artifact,
                action,
                stage,
                produced_in,
            } => {
                let info = info
                    .with_context_entry("artifact", artifact)
                    .with_context_entry("action", action)
                    .with_context_entry("stage", stage);
                match produced_in {
                    Some(same) if same == stage => info
                        .with_context_entry("produced_in", same)
                        .with_fix_hint(
                            "It is produced in the same stage; move the producing action to an earlier stage.",
                        ),
                    Some(later) => info
                        .with_context_entry("produced_in", later)
                        .with_fix_hint(format!("Stage '{later}' produces it; move that stage earlier.")),
                    None => info.with_fix_hint("Add an action that outputs this artifact to an earlier stage."),
                }
            }
            Self::DuplicateActionName { action, .. } => info
                .with_context_entry("action", action)
                .with_fix_hint("Action names are addressed pipeline-wide; rename one of them."),
            Self::UnknownAction { action, .. } => info
                .with_context_entry("action", action)
                .with_fix_hint("Define the stage holding this action before connecting artifacts to it."),
            Self::DuplicateProducer { artifact, .. } => info
                .with_context_entry("artifact", artifact)
                .with_fix_hint("Give each action output its own artifact name."),
            Self::MultipleConsumers { artifact, .. } => info
                .with_context_entry("artifact", artifact)
                .with_fix_hint("Have the producer emit one artifact per consumer."),
            Self::ArityViolation { action, kind, .. } => info
                .with_context_entry("action", action)
                .with_context_entry("kind", kind)
                .with_fix_hint("Adjust the action's inputs and outputs to what its kind supports."),
            Self::EmptyPipeline { .. } => info.with_fix_hint("Define at least one stage."),
            Self::EmptyStage { stage } => info
                .with_context_entry("stage", stage)
                .with_fix_hint("Add at least one action to the stage or remove it."),
            Self::MisplacedSource { action, stage, .. } => info
                .with_context_entry("action", action)
                .with_context_entry("stage", stage)
                .with_fix_hint("Source actions belong in the first stage, and only there."),
            Self::InvalidName { kind, name } => info
                .with_context_entry("kind", kind)
                .with_context_entry("name", name)
                .with_fix_hint("Use only letters, digits, '.', '@', '-' and '_'."),
        }
    }
}

/// Every structural error found while validating a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("Pipeline '{pipeline}' failed validation with {} error(s): {}", .errors.len(), summarize(.errors))]
pub struct ValidationFailure {
    /// The pipeline name.
    pub pipeline: String,
    /// The errors, in stage order.
    pub errors: Vec<TopologyError>,
}

impl ValidationFailure {
    /// Creates a new validation failure.
    #[must_use]
    pub fn new(pipeline: impl Into<String>, errors: Vec<TopologyError>) -> Self {
        Self {
            pipeline: pipeline.into(),
            errors,
        }
    }

    /// Returns the errors with the given code.
    #[must_use]
    pub fn with_code(&self, code: &str) -> Vec<&TopologyError> {
        self.errors.iter().filter(|e| e.code() == code).collect()
    }
}

fn summarize(errors: &[TopologyError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors raised while loading or checking collaborator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        /// The file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config text could not be parsed.
    #[error("Failed to parse {format} config {origin}: {message}")]
    Parse {
        /// Where the text came from (a path or "<inline>").
        origin: String,
        /// "toml" or "json".
        format: &'static str,
        /// The parser message.
        message: String,
    },

    /// The file extension maps to no supported format.
    #[error("Unsupported config format for {}: expected .toml or .json", .path.display())]
    UnsupportedFormat {
        /// The file path.
        path: PathBuf,
    },

    /// A configuration value is out of range or inconsistent.
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Dotted path of the field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unbound(artifact: &str) -> TopologyError {
        TopologyError::UnboundInput {
            artifact: Artifact::new(artifact),
            action: "EcsDeployAction".to_string(),
            stage: "Deploy".to_string(),
            produced_in: None,
        }
    }

    #[test]
    fn test_contract_error_info_creation() {
        let info = ContractErrorInfo::new("TEST-001", "Test error")
            .with_fix_hint("Fix this by doing that")
            .with_context_entry("stage", "Build");

        assert_eq!(info.code, "TEST-001");
        assert_eq!(info.fix_hint, Some("Fix this by doing that".to_string()));
        assert_eq!(info.context.get("stage"), Some(&"Build".to_string()));
        assert_eq!(info.to_dict()["context"]["stage"], "Build");
    }

    #[test]
    fn test_unbound_input_names_artifact_and_action() {
        let err = unbound("img");
        let message = err.to_string();
        assert!(message.contains("'img'"));
        assert!(message.contains("'EcsDeployAction'"));
        assert_eq!(err.artifact(), Some(&Artifact::new("img")));
        assert_eq!(err.code(), "TOPOLOGY-003-UNBOUND_INPUT");
    }

    #[test]
    fn test_unbound_input_hint_mentions_late_producer() {
        let err = TopologyError::UnboundInput {
            artifact: Artifact::new("img"),
            action: "deploy".to_string(),
            stage: "Deploy".to_string(),
            produced_in: Some("Build".to_string()),
        };
        let info = err.error_info();
        assert!(info.fix_hint.unwrap().contains("'Build'"));
        assert_eq!(info.context.get("produced_in"), Some(&"Build".to_string()));
    }

    #[test]
    fn test_unbound_input_hint_for_same_stage_producer() {
        let err = TopologyError::UnboundInput {
            artifact: Artifact::new("img"),
            action: "second".to_string(),
            stage: "Build".to_string(),
            produced_in: Some("Build".to_string()),
        };
        let hint = err.error_info().fix_hint.unwrap();
        assert!(hint.contains("move the producing action to an earlier stage"));
        assert!(!hint.contains("move that stage earlier"));
    }

    #[test]
    fn test_topology_error_serializes_with_type_tag() {
        let value = serde_json::to_value(unbound("img")).unwrap();
        assert_eq!(value["type"], "unbound_input");
        assert_eq!(value["artifact"], "img");
        assert!(value.get("produced_in").is_none());
    }

    #[test]
    fn test_validation_failure_message_lists_every_error() {
        let failure = ValidationFailure::new("my_pipeline", vec![unbound("a"), unbound("b")]);
        let message = failure.to_string();
        assert!(message.contains("2 error(s)"));
        assert!(message.contains("'a'"));
        assert!(message.contains("'b'"));
        assert_eq!(failure.with_code("TOPOLOGY-003-UNBOUND_INPUT").len(), 2);
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid("network.max_azs", "must be at least 1");
        assert_eq!(err.to_string(), "Invalid value for 'network.max_azs': must be at least 1");
    }
}
