//! Deterministic in-memory [`BrowserControl`] double.
//!
//! Records every side-effectful call so tests can assert the exact order of
//! operations that crossed the gateway.

use async_trait::async_trait;
use parking_lot::Mutex;
use pilot_core_types::{DomNode, Rect};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::control::BrowserControl;
use crate::errors::DriverError;
use crate::util::url_matches;

/// One recorded side effect.
#[derive(Debug, Clone, PartialEq)]
pub enum BrowserOp {
    Navigate(String),
    Type { selector: String, text: String },
    Click { selector: String, force: bool },
}

#[derive(Default)]
struct FakeState {
    url: Option<String>,
    rects: HashMap<String, Rect>,
    dom: Vec<DomNode>,
    ops: Vec<BrowserOp>,
    failing_selectors: HashSet<String>,
    fail_navigation: bool,
}

/// Scriptable browser double for unit and scenario tests.
#[derive(Default)]
pub struct FakeBrowser {
    state: Mutex<FakeState>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend the page is already at `url`.
    pub fn with_url(self, url: impl Into<String>) -> Self {
        self.state.lock().url = Some(url.into());
        self
    }

    /// Register the rect a selector resolves to.
    pub fn with_rect(self, selector: impl Into<String>, rect: Rect) -> Self {
        self.state.lock().rects.insert(selector.into(), rect);
        self
    }

    /// Provide the DOM snapshot returned to the perceiver.
    pub fn with_dom(self, dom: Vec<DomNode>) -> Self {
        self.state.lock().dom = dom;
        self
    }

    /// Make every interaction with `selector` fail.
    pub fn failing_on(self, selector: impl Into<String>) -> Self {
        self.state.lock().failing_selectors.insert(selector.into());
        self
    }

    pub fn fail_navigation(self) -> Self {
        self.state.lock().fail_navigation = true;
        self
    }

    /// Every side-effectful call so far, in order.
    pub fn ops(&self) -> Vec<BrowserOp> {
        self.state.lock().ops.clone()
    }

    fn check_selector(&self, selector: &str) -> Result<(), DriverError> {
        if self.state.lock().failing_selectors.contains(selector) {
            return Err(DriverError::ElementNotFound(selector.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserControl for FakeBrowser {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        if state.fail_navigation {
            return Err(DriverError::Protocol("navigation refused".into()));
        }
        state.ops.push(BrowserOp::Navigate(url.to_string()));
        state.url = Some(url.to_string());
        Ok(())
    }

    async fn type_into(&self, selector: &str, text: &str) -> Result<(), DriverError> {
        self.check_selector(selector)?;
        self.state.lock().ops.push(BrowserOp::Type {
            selector: selector.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn click(&self, selector: &str, force: bool) -> Result<(), DriverError> {
        self.check_selector(selector)?;
        self.state.lock().ops.push(BrowserOp::Click {
            selector: selector.to_string(),
            force,
        });
        Ok(())
    }

    async fn inner_text(&self, selector: &str) -> Result<String, DriverError> {
        self.check_selector(selector)?;
        let state = self.state.lock();
        Ok(state
            .dom
            .iter()
            .find(|node| {
                node.attributes
                    .get("id")
                    .map(|id| format!("#{id}") == selector)
                    .unwrap_or(false)
            })
            .map(|node| node.text.clone())
            .unwrap_or_default())
    }

    async fn query_rect(&self, selector: &str) -> Result<Option<Rect>, DriverError> {
        self.check_selector(selector)?;
        Ok(self.state.lock().rects.get(selector).copied())
    }

    async fn dom_snapshot(&self) -> Result<Vec<DomNode>, DriverError> {
        Ok(self.state.lock().dom.clone())
    }

    async fn wait_for_url(&self, pattern: &str, timeout: Duration) -> Result<(), DriverError> {
        let state = self.state.lock();
        match state.url.as_deref() {
            Some(url) if url_matches(pattern, url) => Ok(()),
            _ => Err(DriverError::Timeout(timeout)),
        }
    }

    async fn current_url(&self) -> Result<Option<String>, DriverError> {
        Ok(self.state.lock().url.clone())
    }

    async fn close(&self) -> Result<(), DriverError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_operations_in_order() {
        let browser = FakeBrowser::new().with_rect(
            "#go",
            Rect {
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 10.0,
            },
        );

        browser.navigate("https://example.org").await.unwrap();
        browser.type_into("#q", "rust").await.unwrap();
        browser.click("#go", false).await.unwrap();

        assert_eq!(
            browser.ops(),
            vec![
                BrowserOp::Navigate("https://example.org".into()),
                BrowserOp::Type {
                    selector: "#q".into(),
                    text: "rust".into()
                },
                BrowserOp::Click {
                    selector: "#go".into(),
                    force: false
                },
            ]
        );
    }

    #[tokio::test]
    async fn wait_for_url_and_inner_text_follow_page_state() {
        let browser = FakeBrowser::new()
            .with_url("https://x.com/compose/post")
            .with_dom(vec![pilot_core_types::DomNode {
                tag: "button".into(),
                text: "Post".into(),
                attributes: std::collections::BTreeMap::from([(
                    "id".to_string(),
                    "send".to_string(),
                )]),
                rect: Rect {
                    x: 0.0,
                    y: 0.0,
                    width: 10.0,
                    height: 10.0,
                },
            }]);

        browser
            .wait_for_url("/compose", Duration::from_secs(1))
            .await
            .unwrap();
        assert!(browser
            .wait_for_url("/settings", Duration::from_secs(1))
            .await
            .is_err());
        assert_eq!(browser.inner_text("#send").await.unwrap(), "Post");
    }

    #[tokio::test]
    async fn failing_selector_reports_not_found() {
        let browser = FakeBrowser::new().failing_on("#never-there");
        let err = browser.click("#never-there", false).await.unwrap_err();
        assert!(matches!(err, DriverError::ElementNotFound(_)));
        assert!(browser.ops().is_empty());
    }
}
