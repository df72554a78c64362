//! Decision parsing: from a free-form model reply to a typed [`Decision`].

use pilot_core_types::{Action, Decision};
use serde::Deserialize;
use vision_client::extract_json;

/// The model's answer shape before validation.
#[derive(Debug, Deserialize)]
struct RawDecision {
    #[serde(default)]
    reasoning: String,
    action: RawAction,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    name: String,
    url: Option<String>,
    selector: Option<String>,
    text: Option<String>,
    reason: Option<String>,
}

/// Extract and validate a decision from the raw model reply.
///
/// The action alphabet is closed: `BROWSE`, `TYPE`, `CLICK`, `FINISH`,
/// `FAIL`. Anything else, and any variant missing its required fields,
/// parses to `None`.
pub(crate) fn parse_decision(raw: &str) -> Option<Decision> {
    let json = extract_json(raw)?;
    let parsed: RawDecision = serde_json::from_str(&json).ok()?;

    let action = match parsed.action.name.to_uppercase().as_str() {
        "BROWSE" => Action::Browse {
            url: parsed.action.url?,
        },
        "TYPE" => Action::TypeWeb {
            selector: parsed.action.selector?,
            text: parsed.action.text?,
        },
        "CLICK" => Action::ClickWeb {
            selector: parsed.action.selector?,
            force: false,
        },
        "FINISH" => Action::Finish {
            reason: parsed.action.reason.unwrap_or_default(),
        },
        "FAIL" => Action::Fail {
            reason: parsed.action.reason.unwrap_or_default(),
        },
        _ => return None,
    };

    Some(Decision {
        reasoning: parsed.reasoning,
        action,
    })
}
