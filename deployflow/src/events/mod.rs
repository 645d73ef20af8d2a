//! Event sink system for observability.
//!
//! Sinks are handed to the pipeline builder and the stack assembler
//! explicitly; there is no process-wide sink.

mod sink;

#[cfg(test)]
pub use sink::MockEventSink;
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// Event type names emitted by the crate.
pub mod event_types {
    /// A stage was appended to a pipeline builder.
    pub const STAGE_DEFINED: &str = "pipeline.stage_defined";
    /// An artifact was connected between two actions.
    pub const ARTIFACT_CONNECTED: &str = "pipeline.artifact_connected";
    /// A pipeline was validated; `valid` tells the outcome.
    pub const PIPELINE_VALIDATED: &str = "pipeline.validated";
    /// A stack plan was synthesized.
    pub const STACK_SYNTHESIZED: &str = "stack.synthesized";
}
