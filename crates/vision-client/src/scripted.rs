//! Deterministic [`VisionModel`] double used across the test suites.

use async_trait::async_trait;
use parking_lot::Mutex;
use pilot_core_types::Frame;
use std::collections::VecDeque;

use crate::VisionModel;

/// Pops canned replies in order; an exhausted script answers `None`, which
/// callers treat as the model being unavailable.
#[derive(Default)]
pub struct ScriptedVision {
    replies: Mutex<VecDeque<Option<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedVision {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a sequence of replies, consumed one per query.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|s| Some(s.into())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Append one reply (or an unavailability) to the script.
    pub fn push(&self, reply: Option<String>) {
        self.replies.lock().push_back(reply);
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Number of queries made.
    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl VisionModel for ScriptedVision {
    async fn query(
        &self,
        _frame: &Frame,
        prompt: &str,
        _preference: Option<&[String]>,
    ) -> Option<String> {
        self.prompts.lock().push(prompt.to_string());
        self.replies.lock().pop_front().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replies_pop_in_order_then_run_dry() {
        let vision = ScriptedVision::with_replies(["first", "second"]);
        let frame = Frame::filled(2, 2, [0, 0, 0]);

        assert_eq!(
            vision.query(&frame, "p1", None).await.as_deref(),
            Some("first")
        );
        assert_eq!(
            vision.query(&frame, "p2", None).await.as_deref(),
            Some("second")
        );
        assert_eq!(vision.query(&frame, "p3", None).await, None);
        assert_eq!(vision.calls(), 3);
        assert_eq!(vision.prompts()[1], "p2");
    }
}
