//! Pipeline topology building and validation.
//!
//! This module provides:
//! - Stage specifications
//! - A builder that owns the topology while it is defined
//! - The frozen `Pipeline` and its single-pass artifact validation

mod builder;
mod spec;
mod topology;
mod validate;

pub use builder::PipelineBuilder;
pub use spec::StageSpec;
pub use topology::Pipeline;
