//! Probes the primary monitor once at process start.
//!
//! The result is cached by the caller (in memory, under `display_context`)
//! and re-queried at most once per mission.

use pilot_core_types::DisplayContext;
use thiserror::Error;
use tracing::{info, warn};
use xcap::Monitor;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("monitor enumeration failed: {0}")]
    Enumeration(String),

    #[error("no monitors reported by the OS")]
    NoMonitors,
}

/// Probe the primary monitor's geometry and scaling factor.
///
/// Falls back to the first monitor when none is flagged primary, and to a
/// 1.0 scaling factor when the probe reports garbage.
pub fn detect() -> Result<DisplayContext, DisplayError> {
    let monitors = Monitor::all().map_err(|err| DisplayError::Enumeration(err.to_string()))?;
    if monitors.is_empty() {
        return Err(DisplayError::NoMonitors);
    }

    let primary = monitors
        .iter()
        .find(|monitor| monitor.is_primary())
        .unwrap_or(&monitors[0]);

    let scale = primary.scale_factor() as f64;
    let scaling_factor = if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        warn!(reported = scale, "monitor reported unusable scale factor");
        1.0
    };

    let (width, height) = (primary.width(), primary.height());
    let (left, top) = (primary.x(), primary.y());
    let context = DisplayContext {
        scaling_factor,
        resolution: (width, height),
        bbox: (left, top, left + width as i32, top + height as i32),
    };

    info!(
        width,
        height,
        scaling = context.scaling_factor,
        "display context probed"
    );
    Ok(context)
}
