//! Test assertions for validation outcomes.

use crate::errors::{TopologyError, ValidationFailure};
use crate::pipeline::Pipeline;

/// Asserts that the pipeline validates without errors.
pub fn assert_valid(pipeline: &Pipeline) {
    if let Err(failure) = pipeline.validate() {
        panic!("Expected '{}' to be valid, got: {failure}", pipeline.name());
    }
}

/// Asserts that validation fails and returns the failure.
pub fn assert_invalid(pipeline: &Pipeline) -> ValidationFailure {
    match pipeline.validate() {
        Ok(()) => panic!("Expected '{}' to fail validation", pipeline.name()),
        Err(failure) => failure,
    }
}

/// Asserts that validation fails with exactly one error and returns it.
pub fn assert_single_error(pipeline: &Pipeline) -> TopologyError {
    let failure = assert_invalid(pipeline);
    assert_eq!(
        failure.errors.len(),
        1,
        "Expected exactly one error, got {}: {:?}",
        failure.errors.len(),
        failure.errors
    );
    failure.errors.into_iter().next().expect("one error")
}
