//! Agent lifecycle traits, shared collaborators, and the stock agents.

pub mod poster;
pub mod writer;

use action_gateway::ActionGateway;
use async_trait::async_trait;
use brain::Brain;
use kv_memory::MemoryStore;
use std::sync::Arc;
use supervisor::Supervisor;

use crate::AgentFailure;

pub use poster::PosterAgent;
pub use writer::WriterAgent;

/// The shared subsystems the launcher injects into agents.
///
/// The launcher is the sole factory; agents hold non-owning `Arc` handles
/// and clone exactly the collaborators their constructors declare.
#[derive(Clone)]
pub struct Collaborators {
    pub memory: Arc<MemoryStore>,
    pub supervisor: Arc<Supervisor>,
    pub gateway: Arc<ActionGateway>,
    pub brain: Arc<Brain>,
}

/// An agent whose `run` suspends (browser work, vision queries).
#[async_trait]
pub trait MissionAgent: Send {
    fn name(&self) -> &str;

    /// Receive the step's free-form task context before `run`.
    fn set_task_context(&mut self, _task: &str) {}

    async fn run(&mut self) -> Result<(), AgentFailure>;
}

/// An agent that completes synchronously without suspension points.
pub trait BlockingAgent: Send {
    fn name(&self) -> &str;

    fn set_task_context(&mut self, _task: &str) {}

    fn run(&mut self) -> Result<(), AgentFailure>;
}

/// A resolved agent, ready to dispatch. The launcher treats both shapes
/// uniformly: blocking agents run inline, suspending agents are awaited.
pub enum AgentInstance {
    Blocking(Box<dyn BlockingAgent>),
    Async(Box<dyn MissionAgent>),
}

impl AgentInstance {
    pub fn name(&self) -> &str {
        match self {
            AgentInstance::Blocking(agent) => agent.name(),
            AgentInstance::Async(agent) => agent.name(),
        }
    }

    pub fn set_task_context(&mut self, task: &str) {
        match self {
            AgentInstance::Blocking(agent) => agent.set_task_context(task),
            AgentInstance::Async(agent) => agent.set_task_context(task),
        }
    }
}
