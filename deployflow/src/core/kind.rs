//! Action kinds and their artifact arity rules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The external capability an action maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Fetches source code on each new commit (source provider).
    SourceFetch,
    /// Runs a build specification against its inputs (build runner).
    Build,
    /// Rolls a new image reference out to a running service (deploy target).
    Deploy,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceFetch => write!(f, "source_fetch"),
            Self::Build => write!(f, "build"),
            Self::Deploy => write!(f, "deploy"),
        }
    }
}

/// Which side of an action an artifact sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactDirection {
    /// Artifacts the action consumes.
    Input,
    /// Artifacts the action produces.
    Output,
}

impl fmt::Display for ArtifactDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// Inclusive bounds on the number of artifacts on one side of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arity {
    /// Minimum number of artifacts.
    pub min: usize,
    /// Maximum number of artifacts, unbounded when `None`.
    pub max: Option<usize>,
}

impl Arity {
    const fn exactly(n: usize) -> Self {
        Self { min: n, max: Some(n) }
    }

    const fn at_least(n: usize) -> Self {
        Self { min: n, max: None }
    }

    /// Returns true if `count` falls within the bounds.
    #[must_use]
    pub fn allows(&self, count: usize) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "exactly {max}"),
            Some(max) => write!(f, "between {} and {max}", self.min),
            None => write!(f, "at least {}", self.min),
        }
    }
}

impl ActionKind {
    /// Returns how many input artifacts an action of this kind accepts.
    #[must_use]
    pub const fn input_arity(self) -> Arity {
        match self {
            Self::SourceFetch => Arity::exactly(0),
            Self::Build => Arity::at_least(1),
            Self::Deploy => Arity::exactly(1),
        }
    }

    /// Returns how many output artifacts an action of this kind produces.
    #[must_use]
    pub const fn output_arity(self) -> Arity {
        match self {
            Self::SourceFetch => Arity::exactly(1),
            Self::Build => Arity::at_least(0),
            Self::Deploy => Arity::exactly(0),
        }
    }

    /// Returns the arity for the given direction.
    #[must_use]
    pub const fn arity(self, direction: ArtifactDirection) -> Arity {
        match direction {
            ArtifactDirection::Input => self.input_arity(),
            ArtifactDirection::Output => self.output_arity(),
        }
    }

    /// Returns true if actions of this kind may only appear in the first stage.
    #[must_use]
    pub const fn is_source(self) -> bool {
        matches!(self, Self::SourceFetch)
    }
}
