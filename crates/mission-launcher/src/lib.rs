//! Mission launcher: loads a plan, resolves agents from the registry,
//! injects shared collaborators, and drives every step through its status
//! lifecycle with crash-safe checkpointing.
//!
//! The persisted plan is the journal — the system's only durable state
//! besides memory. Every transition is flushed before the next observable
//! action so a crash leaves the journal in a valid state.

pub mod agents;
pub mod plan;
pub mod registry;
pub mod runner;

use thiserror::Error;

pub use agents::{AgentInstance, BlockingAgent, Collaborators, MissionAgent};
pub use plan::{default_plan, load_plan, save_plan, MissionPlan, Step, StepStatus};
pub use registry::{AgentDescriptor, AgentRegistry};
pub use runner::MissionRunner;

/// Errors that abort a mission before or between steps.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("mission plan I/O failed: {0}")]
    PlanIo(#[from] std::io::Error),

    #[error("mission plan is malformed: {0}")]
    PlanMalformed(String),

    #[error("agent registry is malformed: {0}")]
    RegistryMalformed(String),
}

/// An agent run that terminated abnormally. Marks the step `error`; the
/// mission continues with the next step.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct AgentFailure(pub String);

impl AgentFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
