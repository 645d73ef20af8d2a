//! Testing utilities for deployflow pipelines.
//!
//! This module provides:
//! - Action and pipeline fixtures
//! - Assertions for validation outcomes

mod assertions;
mod fixtures;

pub use assertions::{assert_invalid, assert_single_error, assert_valid};
pub use fixtures::{build_action, delivery_pipeline, deploy_action, source_action, wide_pipeline};
