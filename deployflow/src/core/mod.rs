//! Core domain model types for deployflow.
//!
//! This module contains the fundamental types of a pipeline topology:
//! - Artifact handles
//! - Actions and the capabilities they invoke
//! - Action kinds with their artifact arity rules

mod action;
mod artifact;
mod kind;

pub use action::{Action, Capability};
pub use artifact::Artifact;
pub use kind::{ActionKind, ArtifactDirection, Arity};
