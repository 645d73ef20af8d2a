//! Stage specifications.

use crate::core::{Action, ArtifactDirection};
use crate::errors::{NameKind, TopologyError};
use crate::utils::is_valid_name;
use serde::{Deserialize, Serialize};

/// Specification for a single stage in a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpec {
    /// The unique name of the stage.
    pub name: String,
    /// The actions of the stage, in declaration order.
    pub actions: Vec<Action>,
}

impl StageSpec {
    /// Creates a new stage specification.
    #[must_use]
    pub fn new(name: impl Into<String>, actions: Vec<Action>) -> Self {
        Self {
            name: name.into(),
            actions,
        }
    }

    /// Adds an action.
    #[must_use]
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Returns the action with the given name.
    #[must_use]
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    pub(crate) fn action_mut(&mut self, name: &str) -> Option<&mut Action> {
        self.actions.iter_mut().find(|a| a.name == name)
    }

    /// Checks everything that can be decided from the stage alone: names,
    /// emptiness and per-kind artifact arity.
    ///
    /// Returns every problem found rather than stopping at the first.
    #[must_use]
    pub fn validate(&self) -> Vec<TopologyError> {
        let mut errors = Vec::new();

        if !is_valid_name(&self.name) {
            errors.push(TopologyError::InvalidName {
                kind: NameKind::Stage,
                name: self.name.clone(),
            });
        }
        if self.actions.is_empty() {
            errors.push(TopologyError::EmptyStage {
                stage: self.name.clone(),
            });
        }

        for action in &self.actions {
            if !is_valid_name(&action.name) {
                errors.push(TopologyError::InvalidName {
                    kind: NameKind::Action,
                    name: action.name.clone(),
                });
            }
            for artifact in action.distinct_inputs().chain(action.distinct_outputs()) {
                if !is_valid_name(artifact.name()) {
                    errors.push(TopologyError::InvalidName {
                        kind: NameKind::Artifact,
                        name: artifact.name().to_string(),
                    });
                }
            }

            let kind = action.kind();
            for (direction, count) in [
                (ArtifactDirection::Input, action.distinct_inputs().count()),
                (ArtifactDirection::Output, action.distinct_outputs().count()),
            ] {
                let arity = kind.arity(direction);
                if !arity.allows(count) {
                    errors.push(TopologyError::ArityViolation {
                        action: action.name.clone(),
                        kind,
                        direction,
                        expected: arity.to_string(),
                        actual: count,
                    });
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{build_action, deploy_action, source_action};

    #[test]
    fn test_stage_spec_creation() {
        let spec = StageSpec::new("Source", vec![source_action("github_source", "src")]);
        assert_eq!(spec.name, "Source");
        assert!(spec.action("github_source").is_some());
        assert!(spec.action("missing").is_none());
        assert!(spec.validate().is_empty());
    }

    #[test]
    fn test_empty_stage() {
        let errors = StageSpec::new("Build", Vec::new()).validate();
        assert_eq!(errors, vec![TopologyError::EmptyStage { stage: "Build".to_string() }]);
    }

    #[test]
    fn test_invalid_names_reported() {
        let spec = StageSpec::new("bad stage", vec![source_action("bad action", "bad/artifact")]);
        let errors = spec.validate();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|e| e.code() == "TOPOLOGY-012-INVALID_NAME"));
    }

    #[test]
    fn test_arity_violations() {
        let spec = StageSpec::new(
            "Deploy",
            vec![deploy_action("deploy", &["a", "b"]).with_output("c")],
        );
        let errors = spec.validate();
        assert_eq!(errors.len(), 2);
        assert!(matches!(
            &errors[0],
            TopologyError::ArityViolation { direction: ArtifactDirection::Input, actual: 2, .. }
        ));
        assert!(matches!(
            &errors[1],
            TopologyError::ArityViolation { direction: ArtifactDirection::Output, actual: 1, .. }
        ));
    }

    #[test]
    fn test_build_without_inputs() {
        let spec = StageSpec::new("Build", vec![build_action("Build", &[], &["img"])]);
        let errors = spec.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), "TOPOLOGY-008-ARITY");
    }
}
