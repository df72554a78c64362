//! The step loop: resolve, journal, dispatch, journal again.

use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::agents::{AgentInstance, Collaborators};
use crate::plan::{load_plan, save_plan, MissionPlan, StepStatus};
use crate::registry::{instantiate, AgentRegistry};
use crate::LaunchError;

pub struct MissionRunner {
    plan_path: PathBuf,
    registry: AgentRegistry,
    collaborators: Collaborators,
}

impl MissionRunner {
    pub fn new(
        plan_path: impl Into<PathBuf>,
        registry: AgentRegistry,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            plan_path: plan_path.into(),
            registry,
            collaborators,
        }
    }

    /// Run every pending step in order. A failed step never halts the
    /// mission; each status transition is persisted before anything else
    /// happens, so the plan file is a crash-safe journal.
    pub async fn run(&self) -> Result<MissionPlan, LaunchError> {
        let mut plan = load_plan(&self.plan_path)?;
        info!(goal = %plan.goal, steps = plan.steps.len(), "mission loaded");

        for index in 0..plan.steps.len() {
            let agent_name = plan.steps[index].agent.clone();
            let task = plan.steps[index].task.clone();

            if plan.steps[index].status != StepStatus::Pending {
                info!(
                    agent = %agent_name,
                    status = ?plan.steps[index].status,
                    "skipping step already past pending"
                );
                continue;
            }

            // Resolution precedes the in_progress transition: an unknown
            // agent journals exactly pending -> unavailable.
            let instance = self
                .registry
                .resolve(&agent_name)
                .and_then(|descriptor| instantiate(&descriptor, &self.collaborators));
            let Some(mut instance) = instance else {
                warn!(agent = %agent_name, "no implementation for agent, skipping step");
                plan.steps[index].status = StepStatus::Unavailable;
                save_plan(&self.plan_path, &plan)?;
                continue;
            };
            instance.set_task_context(&task);

            plan.steps[index].status = StepStatus::InProgress;
            save_plan(&self.plan_path, &plan)?;

            info!(agent = %agent_name, task = %task, "launching step");
            let result = match &mut instance {
                AgentInstance::Blocking(agent) => agent.run(),
                AgentInstance::Async(agent) => agent.run().await,
            };

            match result {
                Ok(()) => {
                    info!(agent = %agent_name, "step completed");
                    plan.steps[index].status = StepStatus::Completed;
                }
                Err(failure) => {
                    error!(agent = %agent_name, error = %failure, "step failed");
                    plan.steps[index].status = StepStatus::Error;
                    plan.steps[index].error = Some(failure.to_string());
                }
            }
            save_plan(&self.plan_path, &plan)?;
        }

        info!("all mission steps handled");
        Ok(plan)
    }
}
