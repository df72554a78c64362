//! Prompt assembly for the think phase.
//!
//! The history rides inside the prompt as JSON, which is what turns the
//! stateless model into a planner that can reason about retries and
//! verification.

use pilot_core_types::DomNode;
use serde_json::json;

/// Compact observation handed to the model: visible text plus attributes,
/// for elements that actually carry text.
pub(crate) fn compact_dom(elements: &[DomNode]) -> String {
    let compact: Vec<_> = elements
        .iter()
        .filter(|el| !el.text.trim().is_empty())
        .map(|el| {
            json!({
                "text": el.text,
                "attributes": el.attributes,
            })
        })
        .collect();
    serde_json::to_string_pretty(&compact).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn build_prompt(goal: &str, history_json: &str, observation: &str) -> String {
    format!(
        r##"You are the brain of an autonomous agent driving a real browser on the user's desktop.

Mission goal: "{goal}"

Selector rules:
- Use standard CSS selectors only. Non-standard pseudo-classes such as :contains() are invalid and will fail.
- To target an element by its visible text, use :has-text('...').
- Prefer [data-testid='...'] attributes whenever they are present in the observation.

Verification rule: after an action that should change the page, check the next observation for the expected change before declaring the mission finished.

History of previous steps and their outcomes (JSON):
{history_json}

Interactive elements currently visible (JSON):
{observation}

Decide the single next logical step. Available actions:
BROWSE(url), TYPE(selector, text), CLICK(selector), FINISH(reason), FAIL(reason).

Respond with one JSON object holding your "reasoning" and the "action" to take.
Example: {{"reasoning": "I need to log in first.", "action": {{"name": "TYPE", "selector": "#username", "text": "my_user"}}}}"##
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilot_core_types::Rect;
    use std::collections::BTreeMap;

    #[test]
    fn compact_dom_drops_textless_elements() {
        let mut attributes = BTreeMap::new();
        attributes.insert("data-testid".to_string(), "tweetButton".to_string());
        let elements = vec![
            DomNode {
                tag: "button".into(),
                text: "Post".into(),
                attributes,
                rect: Rect {
                    x: 0.0,
                    y: 0.0,
                    width: 10.0,
                    height: 10.0,
                },
            },
            DomNode {
                tag: "input".into(),
                text: "   ".into(),
                attributes: BTreeMap::new(),
                rect: Rect {
                    x: 0.0,
                    y: 0.0,
                    width: 10.0,
                    height: 10.0,
                },
            },
        ];

        let observation = compact_dom(&elements);
        assert!(observation.contains("Post"));
        assert!(observation.contains("tweetButton"));
        assert!(!observation.contains("input"));
    }

    #[test]
    fn prompt_embeds_goal_history_and_rules() {
        let prompt = build_prompt("post a tweet", "[]", "[]");
        assert!(prompt.contains("post a tweet"));
        assert!(prompt.contains(":has-text"));
        assert!(prompt.contains("FINISH(reason)"));
    }
}
