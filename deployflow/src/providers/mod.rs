//! Configuration for the managed services the stack is wired from.
//!
//! Nothing in this module talks to a provider. Each type is a closed,
//! documented set of options that is checked locally and then forwarded
//! verbatim to the service that owns the behavior.

mod build;
mod deploy;
mod network;
mod policy;
mod registry;
mod service;
mod source;

pub use build::{
    BuildArtifacts, BuildEnvironment, BuildImage, BuildPhase, BuildPhases, BuildRunner, BuildSpec,
    ImageBuildOptions,
};
pub use deploy::{DeployTarget, ServiceRef};
pub use network::NetworkConfig;
pub use policy::ManagedPolicy;
pub use registry::{ContainerRegistry, TagMutability};
pub use service::{ContainerService, ContainerSpec};
pub use source::{SecretRef, SourceProvider, SourceTrigger};
