//! Supervisor request/journal records and the risk keyword set.

use chrono::{DateTime, Utc};
use pilot_core_types::ActionKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Task-context keywords that mark an action as committing or publishing
/// something. Closed set, matched case-insensitively.
pub const RISK_KEYWORDS: [&str; 12] = [
    "post",
    "delete",
    "confirm",
    "purchase",
    "send",
    "submit",
    "login",
    "password",
    "credentials",
    "pay",
    "buy",
    "approve",
];

/// An approval request as assembled by the gateway.
///
/// For web clicks the gateway has already resolved the selector to logical
/// coordinates, so `point` is always concrete when a pointer action arrives.
#[derive(Debug, Clone)]
pub struct ApprovalRequest {
    pub agent: String,
    pub kind: ActionKind,
    /// Human-readable rendition of the action payload, journaled verbatim.
    pub value: String,
    /// Logical screen coordinates, present for pointer actions.
    pub point: Option<(i32, i32)>,
    /// The text being typed, present for keyboard actions.
    pub typed_text: Option<String>,
    pub task_context: String,
}

impl ApprovalRequest {
    pub fn new(
        agent: impl Into<String>,
        kind: ActionKind,
        value: impl Into<String>,
        task_context: impl Into<String>,
    ) -> Self {
        Self {
            agent: agent.into(),
            kind,
            value: value.into(),
            point: None,
            typed_text: None,
            task_context: task_context.into(),
        }
    }

    pub fn with_point(mut self, x: i32, y: i32) -> Self {
        self.point = Some((x, y));
        self
    }

    pub fn with_typed_text(mut self, text: impl Into<String>) -> Self {
        self.typed_text = Some(text.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Approved,
    Blocked,
}

/// One append-only journal record; never mutated after insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorDecision {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub agent: String,
    pub action: String,
    pub value: String,
    pub verdict: Verdict,
    pub reason: String,
}

impl SupervisorDecision {
    pub(crate) fn record(request: &ApprovalRequest, verdict: Verdict, reason: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            agent: request.agent.clone(),
            action: request.kind.as_str().to_string(),
            value: request.value.clone(),
            verdict,
            reason,
        }
    }

    pub fn approved(&self) -> bool {
        self.verdict == Verdict::Approved
    }
}

/// The strict JSON shape required from the validator model.
#[derive(Debug, Deserialize)]
pub(crate) struct ValidationReply {
    pub decision: String,
    #[serde(default)]
    pub reason: String,
}
