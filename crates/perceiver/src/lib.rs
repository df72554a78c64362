//! On-demand perception: primary-monitor pixels plus the filtered DOM.
//!
//! There is no polling loop; the brain asks for a snapshot when it is about
//! to think, and the supervisor consumes whatever the brain most recently
//! published.

pub mod screen;

use browser_driver::BrowserControl;
use chrono::Utc;
use parking_lot::Mutex;
use pilot_core_types::{Frame, PerceptionSnapshot};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

pub use screen::{ScreenSource, StaticScreen, XcapScreen};

#[derive(Debug, Error)]
pub enum PerceptionError {
    #[error("screen capture failed: {0}")]
    Capture(String),
}

/// Produces perception snapshots on demand.
pub struct Perceiver {
    screen: Arc<dyn ScreenSource>,
    browser: Arc<dyn BrowserControl>,
    /// When set, every captured frame is also written as PNG here.
    debug_dump_dir: Option<PathBuf>,
    last_hash: Mutex<Option<String>>,
}

impl Perceiver {
    pub fn new(screen: Arc<dyn ScreenSource>, browser: Arc<dyn BrowserControl>) -> Self {
        Self {
            screen,
            browser,
            debug_dump_dir: None,
            last_hash: Mutex::new(None),
        }
    }

    /// Dump every captured frame to `dir` (the `DEBUG_VISION` behavior).
    pub fn with_debug_dump(mut self, dir: impl Into<PathBuf>) -> Self {
        self.debug_dump_dir = Some(dir.into());
        self
    }

    /// Capture a fresh snapshot: frame, filtered DOM, and content hash.
    ///
    /// A dead or absent browser page degrades to an empty DOM rather than an
    /// error; only a failed screen capture is fatal to perception.
    pub async fn snapshot(&self) -> Result<PerceptionSnapshot, PerceptionError> {
        let frame = self.screen.capture().await?;

        let dom_elements = match self.browser.dom_snapshot().await {
            Ok(elements) => elements,
            Err(err) => {
                warn!(error = %err, "DOM snapshot unavailable, continuing with pixels only");
                Vec::new()
            }
        };

        let content_hash = content_hash(&frame);
        if let Some(dir) = &self.debug_dump_dir {
            dump_frame(dir, &frame);
        }

        debug!(
            elements = dom_elements.len(),
            hash = %&content_hash[..12],
            "perception snapshot captured"
        );

        Ok(PerceptionSnapshot {
            frame,
            dom_elements,
            content_hash,
            captured_at: Utc::now(),
        })
    }

    /// Whether the screen changed since the previous call. Updates the stored
    /// fingerprint either way.
    pub fn changed(&self, snapshot: &PerceptionSnapshot) -> bool {
        let mut last = self.last_hash.lock();
        let changed = last.as_deref() != Some(snapshot.content_hash.as_str());
        *last = Some(snapshot.content_hash.clone());
        changed
    }
}

/// SHA-256 fingerprint of the raw frame bytes.
pub fn content_hash(frame: &Frame) -> String {
    let mut hasher = Sha256::new();
    hasher.update(frame.width.to_le_bytes());
    hasher.update(frame.height.to_le_bytes());
    hasher.update(&frame.data);
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

fn dump_frame(dir: &PathBuf, frame: &Frame) {
    let Some(image) =
        image::RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
    else {
        warn!("frame buffer did not match its dimensions, skipping debug dump");
        return;
    };
    let path = dir.join(format!(
        "pilot-frame-{}.png",
        Utc::now().format("%Y%m%d-%H%M%S%.3f")
    ));
    if let Err(err) = image.save(&path) {
        warn!(error = %err, path = %path.display(), "debug frame dump failed");
    }
}
