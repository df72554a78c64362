//! chromiumoxide-backed implementation of [`BrowserControl`].

use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use pilot_core_types::{DomNode, Rect};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::control::BrowserControl;
use crate::errors::DriverError;
use crate::snapshot::{
    forced_click_script, inner_text_script, rect_probe_script, DOM_SNAPSHOT_SCRIPT,
};
use crate::util::url_matches;

/// Launch configuration for the persistent-profile session.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Browser user-data directory; reusing it keeps the user's sessions.
    pub user_data_dir: PathBuf,
    /// Profile name inside the user-data directory.
    pub profile: String,
    pub navigate_timeout: Duration,
    pub action_timeout: Duration,
}

impl DriverConfig {
    pub fn new(user_data_dir: impl Into<PathBuf>) -> Self {
        Self {
            user_data_dir: user_data_dir.into(),
            profile: "Default".to_string(),
            navigate_timeout: Duration::from_secs(60),
            action_timeout: Duration::from_secs(15),
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }
}

/// A head-full Chromium session owning a single page.
///
/// Launched once at process start and closed once at process end; the page is
/// exclusively owned by the brain during a mission.
pub struct ChromiumDriver {
    browser: Mutex<Browser>,
    page: Page,
    handler_task: Mutex<Option<JoinHandle<()>>>,
    config: DriverConfig,
    closed: AtomicBool,
}

impl ChromiumDriver {
    /// Launch the browser with the user's persistent profile and adopt the
    /// first open page, creating one when none exists.
    pub async fn launch(config: DriverConfig) -> Result<Self, DriverError> {
        let browser_config = BrowserConfig::builder()
            .with_head()
            .user_data_dir(&config.user_data_dir)
            .arg(format!("--profile-directory={}", config.profile))
            .build()
            .map_err(DriverError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(DriverError::protocol)?;

        let handler_task = tokio::task::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    warn!(error = %err, "browser handler reported an error");
                }
            }
            debug!("browser handler stream ended");
        });

        let existing = browser.pages().await.map_err(DriverError::protocol)?;
        let page = match existing.into_iter().next() {
            Some(page) => page,
            None => browser
                .new_page("about:blank")
                .await
                .map_err(DriverError::protocol)?,
        };

        info!(
            profile = %config.profile,
            user_data_dir = %config.user_data_dir.display(),
            "browser session launched"
        );

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler_task: Mutex::new(Some(handler_task)),
            config,
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<(), DriverError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DriverError::Closed);
        }
        Ok(())
    }

    async fn with_deadline<T, F>(&self, deadline: Duration, fut: F) -> Result<T, DriverError>
    where
        F: Future<Output = Result<T, DriverError>>,
    {
        match tokio::time::timeout(deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(DriverError::Timeout(deadline)),
        }
    }

    async fn evaluate<T>(&self, script: String) -> Result<T, DriverError>
    where
        T: serde::de::DeserializeOwned,
    {
        self.page
            .evaluate(script)
            .await
            .map_err(DriverError::protocol)?
            .into_value::<T>()
            .map_err(DriverError::protocol)
    }
}

#[async_trait]
impl BrowserControl for ChromiumDriver {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.ensure_open()?;
        debug!(url, "navigating");
        self.with_deadline(self.config.navigate_timeout, async {
            self.page.goto(url).await.map_err(DriverError::protocol)?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(DriverError::protocol)?;
            Ok(())
        })
        .await
    }

    async fn type_into(&self, selector: &str, text: &str) -> Result<(), DriverError> {
        self.ensure_open()?;
        debug!(selector, "typing into element");
        self.with_deadline(self.config.action_timeout, async {
            let element = self
                .page
                .find_element(selector)
                .await
                .map_err(|_| DriverError::ElementNotFound(selector.to_string()))?;
            element.click().await.map_err(DriverError::protocol)?;
            element.type_str(text).await.map_err(DriverError::protocol)?;
            Ok(())
        })
        .await
    }

    async fn click(&self, selector: &str, force: bool) -> Result<(), DriverError> {
        self.ensure_open()?;
        debug!(selector, force, "clicking element");
        self.with_deadline(self.config.action_timeout, async {
            if force {
                let found: bool = self.evaluate(forced_click_script(selector)).await?;
                if !found {
                    return Err(DriverError::ElementNotFound(selector.to_string()));
                }
                return Ok(());
            }
            let element = self
                .page
                .find_element(selector)
                .await
                .map_err(|_| DriverError::ElementNotFound(selector.to_string()))?;
            element.click().await.map_err(DriverError::protocol)?;
            Ok(())
        })
        .await
    }

    async fn inner_text(&self, selector: &str) -> Result<String, DriverError> {
        self.ensure_open()?;
        self.with_deadline(self.config.action_timeout, async {
            let text: Option<String> = self.evaluate(inner_text_script(selector)).await?;
            text.ok_or_else(|| DriverError::ElementNotFound(selector.to_string()))
        })
        .await
    }

    async fn query_rect(&self, selector: &str) -> Result<Option<Rect>, DriverError> {
        self.ensure_open()?;
        self.with_deadline(self.config.action_timeout, async {
            self.evaluate::<Option<Rect>>(rect_probe_script(selector))
                .await
        })
        .await
    }

    async fn dom_snapshot(&self) -> Result<Vec<DomNode>, DriverError> {
        self.ensure_open()?;
        self.with_deadline(self.config.action_timeout, async {
            self.evaluate::<Vec<DomNode>>(DOM_SNAPSHOT_SCRIPT.to_string())
                .await
        })
        .await
    }

    async fn wait_for_url(&self, pattern: &str, timeout: Duration) -> Result<(), DriverError> {
        self.ensure_open()?;
        let deadline = Instant::now() + timeout;
        loop {
            let url = self.page.url().await.map_err(DriverError::protocol)?;
            if let Some(url) = url {
                if url_matches(pattern, &url) {
                    debug!(%url, pattern, "url matched");
                    return Ok(());
                }
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout(timeout));
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    }

    async fn current_url(&self) -> Result<Option<String>, DriverError> {
        self.ensure_open()?;
        self.page.url().await.map_err(DriverError::protocol)
    }

    async fn close(&self) -> Result<(), DriverError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let mut browser = self.browser.lock().await;
        let result = browser.close().await.map(|_| ()).map_err(DriverError::protocol);
        if let Some(task) = self.handler_task.lock().await.take() {
            task.abort();
        }
        info!("browser session closed");
        result
    }
}
