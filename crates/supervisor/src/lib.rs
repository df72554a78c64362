//! The supervisor: last line of defense in front of every side effect.
//!
//! Cheap actions stay cheap: anything that is not a click or typing is
//! auto-approved. Pointer and keyboard actions whose task context smells of
//! committing something are high-risk; clicks are then validated against the
//! latest perception by the vision model, typing by a content check.

pub mod model;

use parking_lot::{Mutex, RwLock};
use pilot_core_types::{ActionKind, PerceptionSnapshot, RiskClass};
use std::sync::Arc;
use tracing::{debug, info, warn};
use vision_client::{extract_json, VisionModel};

pub use model::{ApprovalRequest, SupervisorDecision, Verdict, RISK_KEYWORDS};

use model::ValidationReply;

/// Classify an action by its kind and surrounding text.
///
/// Only pointer and keyboard actions can be high-risk; for typing, the typed
/// value is searched alongside the task context.
pub fn classify(kind: ActionKind, task_context: &str, typed_text: Option<&str>) -> RiskClass {
    if !kind.is_click() && !kind.is_typing() {
        return RiskClass::Low;
    }
    let mut haystack = task_context.to_lowercase();
    if kind.is_typing() {
        if let Some(text) = typed_text {
            haystack.push(' ');
            haystack.push_str(&text.to_lowercase());
        }
    }
    if RISK_KEYWORDS
        .iter()
        .any(|keyword| haystack.contains(keyword))
    {
        RiskClass::High
    } else {
        RiskClass::Low
    }
}

/// Holds the latest perception and journals every verdict.
pub struct Supervisor {
    vision: Arc<dyn VisionModel>,
    perception: RwLock<Option<PerceptionSnapshot>>,
    journal: Mutex<Vec<SupervisorDecision>>,
}

impl Supervisor {
    pub fn new(vision: Arc<dyn VisionModel>) -> Self {
        Self {
            vision,
            perception: RwLock::new(None),
            journal: Mutex::new(Vec::new()),
        }
    }

    /// Publish the most recent snapshot. A single latest-value slot; older
    /// snapshots are dropped.
    pub fn update_perception(&self, snapshot: PerceptionSnapshot) {
        debug!(hash = %&snapshot.content_hash[..12.min(snapshot.content_hash.len())], "perception updated");
        *self.perception.write() = Some(snapshot);
    }

    pub fn has_perception(&self) -> bool {
        self.perception.read().is_some()
    }

    /// Approve or block an action. Never raises toward the gateway; the
    /// verdict plus a journaled reason is the whole contract.
    pub async fn approve_action(&self, request: &ApprovalRequest) -> bool {
        let risk = classify(
            request.kind,
            &request.task_context,
            request.typed_text.as_deref(),
        );

        let (verdict, reason) = match risk {
            RiskClass::Low => (Verdict::Approved, "auto-approved".to_string()),
            RiskClass::High if request.kind.is_typing() => self.check_typed_content(request),
            RiskClass::High => self.validate_click(request).await,
        };

        self.journal(request, verdict, reason);
        verdict == Verdict::Approved
    }

    /// Append-only decision journal, oldest first.
    pub fn decisions(&self) -> Vec<SupervisorDecision> {
        self.journal.lock().clone()
    }

    fn check_typed_content(&self, request: &ApprovalRequest) -> (Verdict, String) {
        let significant = request
            .typed_text
            .as_deref()
            .map(|text| text.chars().filter(|c| !c.is_whitespace()).count())
            .unwrap_or(0);
        if significant >= 3 {
            (Verdict::Approved, "content check passed".to_string())
        } else {
            (Verdict::Blocked, "invalid content".to_string())
        }
    }

    /// Ask the vision model whether a relevant clickable element sits at the
    /// requested coordinates on the latest frame.
    async fn validate_click(&self, request: &ApprovalRequest) -> (Verdict, String) {
        let snapshot = self.perception.read().clone();
        let Some(snapshot) = snapshot else {
            return (Verdict::Blocked, "missing perception".to_string());
        };
        let Some((x, y)) = request.point else {
            return (Verdict::Blocked, "missing coordinates".to_string());
        };

        let prompt = validation_prompt(x, y, &request.task_context);
        let Some(reply) = self.vision.query(&snapshot.frame, &prompt, None).await else {
            warn!("vision unavailable during click validation");
            return (Verdict::Blocked, "vision unavailable".to_string());
        };

        let Some(json) = extract_json(&reply) else {
            return (Verdict::Blocked, "unparseable".to_string());
        };
        let Ok(parsed) = serde_json::from_str::<ValidationReply>(&json) else {
            return (Verdict::Blocked, "unparseable".to_string());
        };

        let reason = if parsed.reason.is_empty() {
            format!("validator said {}", parsed.decision)
        } else {
            parsed.reason
        };
        if parsed.decision.eq_ignore_ascii_case("yes") {
            (Verdict::Approved, reason)
        } else {
            (Verdict::Blocked, reason)
        }
    }

    fn journal(&self, request: &ApprovalRequest, verdict: Verdict, reason: String) {
        let decision = SupervisorDecision::record(request, verdict, reason);
        info!(
            agent = %decision.agent,
            action = %decision.action,
            verdict = ?decision.verdict,
            reason = %decision.reason,
            "supervisor decision"
        );
        self.journal.lock().push(decision);
    }
}

fn validation_prompt(x: i32, y: i32, task_context: &str) -> String {
    format!(
        "You supervise an autonomous agent that is about to click at logical screen \
         coordinates ({x}, {y}).\n\
         The agent's current task: \"{task_context}\".\n\
         Look at the attached screenshot of the primary monitor. Is there a clearly \
         clickable UI element relevant to this task at or very near those coordinates?\n\
         Respond with strict JSON only, no prose: \
         {{\"decision\": \"Yes\"|\"No\", \"reason\": \"...\"}}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pilot_core_types::Frame;
    use vision_client::ScriptedVision;

    fn snapshot() -> PerceptionSnapshot {
        let frame = Frame::filled(4, 4, [9, 9, 9]);
        PerceptionSnapshot {
            content_hash: perceiver_hash(&frame),
            frame,
            dom_elements: Vec::new(),
            captured_at: Utc::now(),
        }
    }

    // Local stand-in so this crate does not depend on the perceiver.
    fn perceiver_hash(frame: &Frame) -> String {
        format!("{}x{}-{}", frame.width, frame.height, frame.data.len())
    }

    fn click_request(task: &str) -> ApprovalRequest {
        ApprovalRequest::new("Brain", ActionKind::ClickWeb, "#go @ (10, 10)", task)
            .with_point(10, 10)
    }

    #[test]
    fn keyword_matches_raise_click_risk() {
        assert_eq!(
            classify(ActionKind::ClickWeb, "Post the tweet", None),
            RiskClass::High
        );
        assert_eq!(
            classify(ActionKind::ClickWeb, "scroll the timeline", None),
            RiskClass::Low
        );
        // Case-insensitive.
        assert_eq!(
            classify(ActionKind::ClickOs, "CONFIRM the dialog", None),
            RiskClass::High
        );
    }

    #[test]
    fn typed_value_participates_in_classification() {
        assert_eq!(
            classify(ActionKind::TypeWeb, "fill the form", Some("my password here")),
            RiskClass::High
        );
        assert_eq!(
            classify(ActionKind::TypeWeb, "fill the form", Some("just a note")),
            RiskClass::Low
        );
    }

    #[test]
    fn non_interactive_kinds_are_always_low() {
        assert_eq!(
            classify(ActionKind::Browse, "login and post and buy", None),
            RiskClass::Low
        );
    }

    #[tokio::test]
    async fn low_risk_approves_without_vision() {
        let vision = Arc::new(ScriptedVision::new());
        let supervisor = Supervisor::new(vision.clone());

        let request =
            ApprovalRequest::new("Brain", ActionKind::Browse, "https://example.org", "post it");
        assert!(supervisor.approve_action(&request).await);
        assert_eq!(vision.calls(), 0);

        let decisions = supervisor.decisions();
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].reason, "auto-approved");
        assert!(decisions[0].approved());
    }

    #[tokio::test]
    async fn high_risk_click_without_perception_is_blocked() {
        let vision = Arc::new(ScriptedVision::with_replies([r#"{"decision":"Yes"}"#]));
        let supervisor = Supervisor::new(vision.clone());

        assert!(!supervisor.approve_action(&click_request("post tweet")).await);
        // Blocked before the model was ever consulted.
        assert_eq!(vision.calls(), 0);
        assert_eq!(supervisor.decisions()[0].reason, "missing perception");
    }

    #[tokio::test]
    async fn high_risk_click_follows_validator_verdict() {
        let vision = Arc::new(ScriptedVision::with_replies([
            r#"{"decision": "Yes", "reason": "Post button at target"}"#,
            r#"{"decision": "No", "reason": "nothing clickable there"}"#,
        ]));
        let supervisor = Supervisor::new(vision.clone());
        supervisor.update_perception(snapshot());

        assert!(supervisor.approve_action(&click_request("post tweet")).await);
        assert!(!supervisor.approve_action(&click_request("post tweet")).await);

        let decisions = supervisor.decisions();
        assert_eq!(decisions[0].reason, "Post button at target");
        assert_eq!(decisions[1].verdict, Verdict::Blocked);
        // The prompt carried the coordinates and the task.
        assert!(vision.prompts()[0].contains("(10, 10)"));
        assert!(vision.prompts()[0].contains("post tweet"));
    }

    #[tokio::test]
    async fn validator_prose_is_tolerated_and_garbage_blocks() {
        let vision = Arc::new(ScriptedVision::with_replies([
            "Sure thing!\n```json\n{\"decision\": \"Yes\", \"reason\": \"ok\"}\n```",
            "I think you should click it",
        ]));
        let supervisor = Supervisor::new(vision);
        supervisor.update_perception(snapshot());

        assert!(supervisor.approve_action(&click_request("submit form")).await);
        assert!(!supervisor.approve_action(&click_request("submit form")).await);
        assert_eq!(supervisor.decisions()[1].reason, "unparseable");
    }

    #[tokio::test]
    async fn vision_outage_blocks_high_risk_clicks() {
        let vision = Arc::new(ScriptedVision::new());
        let supervisor = Supervisor::new(vision);
        supervisor.update_perception(snapshot());

        assert!(!supervisor.approve_action(&click_request("buy now")).await);
        assert_eq!(supervisor.decisions()[0].reason, "vision unavailable");
    }

    #[tokio::test]
    async fn high_risk_typing_uses_content_check_only() {
        let vision = Arc::new(ScriptedVision::new());
        let supervisor = Supervisor::new(vision.clone());

        let ok = ApprovalRequest::new("Brain", ActionKind::TypeWeb, "#box", "post tweet")
            .with_typed_text("hello world");
        let too_short = ApprovalRequest::new("Brain", ActionKind::TypeWeb, "#box", "post tweet")
            .with_typed_text("  a ");

        assert!(supervisor.approve_action(&ok).await);
        assert!(!supervisor.approve_action(&too_short).await);
        assert_eq!(vision.calls(), 0);
        assert_eq!(supervisor.decisions()[1].reason, "invalid content");
    }
}
