//! Screen sources: the xcap-backed capture and a static test double.

use async_trait::async_trait;
use pilot_core_types::Frame;
use xcap::Monitor;

use crate::PerceptionError;

/// Seam for raw frame capture of the primary monitor.
#[async_trait]
pub trait ScreenSource: Send + Sync {
    async fn capture(&self) -> Result<Frame, PerceptionError>;
}

/// Captures the primary monitor through xcap.
#[derive(Default)]
pub struct XcapScreen;

impl XcapScreen {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ScreenSource for XcapScreen {
    async fn capture(&self) -> Result<Frame, PerceptionError> {
        // Capture is CPU-bound and synchronous; run it off the reactor.
        let frame = tokio::task::spawn_blocking(|| -> Result<Frame, PerceptionError> {
            let monitors =
                Monitor::all().map_err(|err| PerceptionError::Capture(err.to_string()))?;
            let primary = monitors
                .into_iter()
                .find(|monitor| monitor.is_primary())
                .ok_or_else(|| PerceptionError::Capture("no primary monitor".to_string()))?;

            let rgba = primary
                .capture_image()
                .map_err(|err| PerceptionError::Capture(err.to_string()))?;
            let (width, height) = (rgba.width(), rgba.height());

            let mut data = Vec::with_capacity((width as usize) * (height as usize) * 3);
            for pixel in rgba.pixels() {
                data.extend_from_slice(&pixel.0[..3]);
            }
            Ok(Frame::new(width, height, data))
        })
        .await
        .map_err(|err| PerceptionError::Capture(err.to_string()))??;

        Ok(frame)
    }
}

/// Always returns the same frame; for tests and offline development.
pub struct StaticScreen {
    frame: Frame,
}

impl StaticScreen {
    pub fn new(frame: Frame) -> Self {
        Self { frame }
    }

    /// A small uniform gray frame.
    pub fn gray(width: u32, height: u32) -> Self {
        Self::new(Frame::filled(width, height, [128, 128, 128]))
    }
}

#[async_trait]
impl ScreenSource for StaticScreen {
    async fn capture(&self) -> Result<Frame, PerceptionError> {
        Ok(self.frame.clone())
    }
}
