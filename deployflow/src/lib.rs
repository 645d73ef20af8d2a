//! # Deployflow
//!
//! A typed description of a container delivery stack: a Source → Build →
//! Deploy pipeline, the resources it feeds, and a single-pass check that
//! every artifact an action consumes exists before its stage starts.
//!
//! Deployflow provides:
//!
//! - **Pipeline topology**: ordered stages of source, build and deploy actions
//! - **Artifact validation**: unbound inputs, duplicate producers, arity and
//!   placement errors, all reported in one pass
//! - **Stack assembly**: network, registry, build project and service wired
//!   together from a TOML or JSON configuration
//! - **Event-driven observability**: construction and validation events
//!
//! ## Quick Start
//!
//! ```rust
//! use deployflow::prelude::*;
//!
//! let pipeline = PipelineBuilder::new("my_pipeline")
//!     .define_stage("Source", vec![Action::source("github_source", SourceProvider::default())])?
//!     .define_stage("Build", vec![Action::build("Build", "my-codepipeline")])?
//!     .connect_artifact("github_source", "Build", "source_output")?
//!     .build();
//!
//! assert!(pipeline.validate().is_ok());
//! # Ok::<(), deployflow::errors::TopologyError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod pipeline;
pub mod providers;
pub mod stack;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::StackConfig;
    pub use crate::core::{Action, ActionKind, Artifact, Capability};
    pub use crate::errors::{ConfigError, DeployflowError, TopologyError, ValidationFailure};
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::pipeline::{Pipeline, PipelineBuilder, StageSpec};
    pub use crate::providers::{DeployTarget, ServiceRef, SourceProvider};
    pub use crate::stack::{DeliveryStack, StackPlan};
}
