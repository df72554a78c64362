use crate::errors::DriverError;
use async_trait::async_trait;
use pilot_core_types::{DomNode, Rect};
use std::time::Duration;

/// The one seam through which the runtime touches a browser page.
///
/// Operations are one-at-a-time against a single page; callers serialize
/// access. Every method carries its own deadline inside the implementation,
/// and a timeout surfaces as [`DriverError::Timeout`].
#[async_trait]
pub trait BrowserControl: Send + Sync {
    /// Navigate the page and wait until the document has loaded.
    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    /// Type `text` into the first element matching `selector`.
    async fn type_into(&self, selector: &str, text: &str) -> Result<(), DriverError>;

    /// Click the first element matching `selector`. When `force` is set the
    /// click is dispatched from script, bypassing actionability checks.
    async fn click(&self, selector: &str, force: bool) -> Result<(), DriverError>;

    /// Inner text of the first element matching `selector`.
    async fn inner_text(&self, selector: &str) -> Result<String, DriverError>;

    /// Viewport bounding rect of the first element matching `selector`, in
    /// CSS pixels. `None` when nothing matches.
    async fn query_rect(&self, selector: &str) -> Result<Option<Rect>, DriverError>;

    /// The filtered interactive-element snapshot of the current page.
    async fn dom_snapshot(&self) -> Result<Vec<DomNode>, DriverError>;

    /// Poll until the page URL matches `pattern` (regex, `*` glob, or plain
    /// substring) or the deadline passes.
    async fn wait_for_url(&self, pattern: &str, timeout: Duration) -> Result<(), DriverError>;

    /// The page's current URL, when one is known.
    async fn current_url(&self) -> Result<Option<String>, DriverError>;

    /// Close the page and tear down the browser session.
    async fn close(&self) -> Result<(), DriverError>;
}
