//! The closed action alphabet and the records built around it.

use serde::{Deserialize, Serialize};

/// Everything an agent may ask the gateway to do, as a closed sum type.
///
/// Each variant carries exactly the payload its executor needs. `Finish` and
/// `Fail` are terminal markers for the brain loop and are never executable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Navigate the controlled browser page to a URL.
    Browse { url: String },
    /// Type text into the element matching a CSS selector.
    TypeWeb { selector: String, text: String },
    /// Click the element matching a CSS selector. `force` bypasses the
    /// driver's actionability checks.
    ClickWeb {
        selector: String,
        #[serde(default)]
        force: bool,
    },
    /// Type text through the OS input driver into whatever holds focus.
    TypeOs { text: String },
    /// Click at logical screen coordinates through the OS input driver.
    ClickOs { x: i32, y: i32 },
    /// Terminate the mission as achieved.
    Finish { reason: String },
    /// Terminate the mission as impossible.
    Fail { reason: String },
}

impl Action {
    /// The gateway-facing action type, when one exists.
    pub fn kind(&self) -> Option<ActionKind> {
        match self {
            Action::Browse { .. } => Some(ActionKind::Browse),
            Action::TypeWeb { .. } => Some(ActionKind::TypeWeb),
            Action::ClickWeb { .. } => Some(ActionKind::ClickWeb),
            Action::TypeOs { .. } => Some(ActionKind::TypeOs),
            Action::ClickOs { .. } => Some(ActionKind::ClickOs),
            Action::Finish { .. } | Action::Fail { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Action::Finish { .. } | Action::Fail { .. })
    }
}

/// Gateway action types; the string forms are the wire/journal names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Browse,
    ClickWeb,
    TypeWeb,
    /// OS-level click; journaled as `click`.
    #[serde(rename = "click")]
    ClickOs,
    /// OS-level typing; journaled as `type_text`.
    #[serde(rename = "type_text")]
    TypeOs,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Browse => "browse",
            ActionKind::ClickWeb => "click_web",
            ActionKind::TypeWeb => "type_web",
            ActionKind::ClickOs => "click",
            ActionKind::TypeOs => "type_text",
        }
    }

    /// Pointer actions are subject to visual validation when high-risk.
    pub fn is_click(&self) -> bool {
        matches!(self, ActionKind::ClickWeb | ActionKind::ClickOs)
    }

    /// Keyboard actions are subject to the content check when high-risk.
    pub fn is_typing(&self) -> bool {
        matches!(self, ActionKind::TypeWeb | ActionKind::TypeOs)
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk classification assigned by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskClass {
    Low,
    High,
}

/// Outcome of an executed action, appended to the owning history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    Success,
    Failure,
}

/// One model decision: free-form reasoning plus the chosen action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub reasoning: String,
    pub action: Action,
}

/// A chain-of-thought entry. Actions are held by value so the history can be
/// serialized verbatim into the next prompt, independent of browser state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub reasoning: String,
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ActionOutcome>,
}

impl HistoryEntry {
    pub fn new(decision: Decision) -> Self {
        Self {
            reasoning: decision.reasoning,
            action: decision.action,
            outcome: None,
        }
    }
}
