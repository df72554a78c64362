//! The action gateway: every externally observable side effect passes
//! through here, exactly once, with a supervisor verdict in front of it.
//!
//! The logical-vs-physical coordinate arithmetic lives here so neither the
//! brain nor the agents ever do that math. Web clicks are resolved to
//! concrete logical coordinates *before* the supervisor is consulted, so
//! visual validation always sees the point that would be clicked.

use browser_driver::{BrowserControl, DriverError};
use os_input::{InputDriver, InputError};
use pilot_core_types::{Action, ActionKind, DisplayContext, Rect};
use std::sync::Arc;
use supervisor::{ApprovalRequest, Supervisor};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Internal executor failures; callers only ever see `false`.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Browser(#[from] DriverError),

    #[error(transparent)]
    Input(#[from] InputError),
}

/// What an approved action resolves to, after coordinate translation.
enum Dispatch<'a> {
    Navigate(&'a str),
    TypeWeb { selector: &'a str, text: &'a str },
    ForcedClick { selector: &'a str },
    OsClick { x: i32, y: i32 },
    OsType { text: &'a str },
}

pub struct ActionGateway {
    supervisor: Arc<Supervisor>,
    browser: Arc<dyn BrowserControl>,
    input: Arc<dyn InputDriver>,
    display: DisplayContext,
}

impl ActionGateway {
    pub fn new(
        supervisor: Arc<Supervisor>,
        browser: Arc<dyn BrowserControl>,
        input: Arc<dyn InputDriver>,
        display: DisplayContext,
    ) -> Self {
        Self {
            supervisor,
            browser,
            input,
            display,
        }
    }

    /// Request a side effect on behalf of `agent`.
    ///
    /// Returns `false` when the supervisor blocks or the executor fails; no
    /// side effect has happened in the blocked case. Terminal actions
    /// (`Finish`/`Fail`) are not executable and are rejected outright.
    pub async fn request_action(&self, agent: &str, action: &Action, task_context: &str) -> bool {
        let Some(kind) = action.kind() else {
            warn!(agent, ?action, "terminal action reached the gateway");
            return false;
        };

        let (request, dispatch) = match self.prepare(agent, kind, action, task_context).await {
            Ok(prepared) => prepared,
            Err(err) => {
                warn!(agent, kind = %kind, error = %err, "action preparation failed");
                return false;
            }
        };

        if !self.supervisor.approve_action(&request).await {
            info!(agent, kind = %kind, value = %request.value, "supervisor blocked action");
            return false;
        }

        match self.execute(dispatch).await {
            Ok(()) => {
                debug!(agent, kind = %kind, "action executed");
                true
            }
            Err(err) => {
                warn!(agent, kind = %kind, error = %err, "action execution failed");
                false
            }
        }
    }

    /// Resolve payloads into an approval request plus a ready executor.
    async fn prepare<'a>(
        &self,
        agent: &str,
        kind: ActionKind,
        action: &'a Action,
        task_context: &str,
    ) -> Result<(ApprovalRequest, Dispatch<'a>), GatewayError> {
        Ok(match action {
            Action::Browse { url } => (
                ApprovalRequest::new(agent, kind, url.clone(), task_context),
                Dispatch::Navigate(url),
            ),
            Action::TypeWeb { selector, text } => (
                ApprovalRequest::new(agent, kind, format!("{selector} <- {text}"), task_context)
                    .with_typed_text(text.clone()),
                Dispatch::TypeWeb { selector, text },
            ),
            Action::TypeOs { text } => (
                ApprovalRequest::new(agent, kind, text.clone(), task_context)
                    .with_typed_text(text.clone()),
                Dispatch::OsType { text },
            ),
            Action::ClickOs { x, y } => {
                let (cx, cy) = self.display.clamp_logical(*x, *y);
                (
                    ApprovalRequest::new(agent, kind, format!("({cx}, {cy})"), task_context)
                        .with_point(cx, cy),
                    Dispatch::OsClick { x: cx, y: cy },
                )
            }
            Action::ClickWeb { selector, force } => {
                let rect = self
                    .browser
                    .query_rect(selector)
                    .await?
                    .ok_or_else(|| DriverError::ElementNotFound(selector.to_string()))?;
                let (x, y) = self.to_logical(rect);
                let request = ApprovalRequest::new(
                    agent,
                    kind,
                    format!("{selector} @ ({x}, {y})"),
                    task_context,
                )
                .with_point(x, y);
                let dispatch = if *force {
                    Dispatch::ForcedClick { selector }
                } else {
                    Dispatch::OsClick { x, y }
                };
                (request, dispatch)
            }
            Action::Finish { .. } | Action::Fail { .. } => unreachable!("kind() filtered terminals"),
        })
    }

    async fn execute(&self, dispatch: Dispatch<'_>) -> Result<(), GatewayError> {
        match dispatch {
            Dispatch::Navigate(url) => self.browser.navigate(url).await?,
            Dispatch::TypeWeb { selector, text } => self.browser.type_into(selector, text).await?,
            Dispatch::ForcedClick { selector } => self.browser.click(selector, true).await?,
            Dispatch::OsClick { x, y } => self.input.click(x, y).await?,
            Dispatch::OsType { text } => self.input.type_text(text).await?,
        }
        Ok(())
    }

    /// CSS center -> logical screen point: divide by the scaling factor,
    /// round, clamp onto the primary monitor.
    fn to_logical(&self, rect: Rect) -> (i32, i32) {
        let scale = self.display.effective_scale();
        let (cx, cy) = rect.center();
        let x = (cx / scale).round() as i32;
        let y = (cy / scale).round() as i32;
        self.display.clamp_logical(x, y)
    }
}
