//! The mission plan file: goal, ordered steps, per-step status journal.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::LaunchError;

/// Lifecycle of a single step.
///
/// Valid persisted sequences are a prefix of
/// `pending -> in_progress -> (completed | error)`, or exactly
/// `unavailable` when the agent cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Error,
    Unavailable,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepStatus::Completed | StepStatus::Error | StepStatus::Unavailable
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Registry key of the agent to launch.
    pub agent: String,
    /// Free-form task context handed to the agent.
    pub task: String,
    #[serde(default)]
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Step {
    pub fn new(agent: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            task: task.into(),
            status: StepStatus::Pending,
            error: None,
        }
    }
}

/// The plan as persisted. `goal` is immutable after mission start; only the
/// launcher mutates step statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionPlan {
    pub goal: String,
    pub steps: Vec<Step>,
}

/// The stock two-step plan the director-equivalent produces.
pub fn default_plan(goal: impl Into<String>) -> MissionPlan {
    MissionPlan {
        goal: goal.into(),
        steps: vec![
            Step::new("WriterAgent", "Write a short post for the timeline"),
            Step::new("PosterAgent", "Post content to X (Twitter)"),
        ],
    }
}

/// Read the plan file. Any I/O or parse error is terminal for the mission.
pub fn load_plan(path: impl AsRef<Path>) -> Result<MissionPlan, LaunchError> {
    let bytes = fs::read(path.as_ref())?;
    serde_json::from_slice(&bytes).map_err(|err| LaunchError::PlanMalformed(err.to_string()))
}

/// Rewrite the plan file atomically: write a sibling temp file, then rename
/// over the original. A crash never leaves a half-written journal.
pub fn save_plan(path: impl AsRef<Path>, plan: &MissionPlan) -> Result<(), LaunchError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let serialized = serde_json::to_vec_pretty(plan)
        .map_err(|err| LaunchError::PlanMalformed(err.to_string()))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serialized)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
