//! Primary-monitor geometry and logical/physical pixel translation.

use serde::{Deserialize, Serialize};

/// Geometry of the primary monitor, captured once at process start and
/// cached in memory under the `display_context` key.
///
/// Browsers report CSS pixels and the OS input driver expects logical screen
/// pixels; `scaling_factor` converts physical pixels into logical ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayContext {
    /// DPI scale (1.25 on a 125% display). 1.0 when the probe failed.
    pub scaling_factor: f64,
    /// Physical pixel resolution of the primary monitor.
    pub resolution: (u32, u32),
    /// Primary monitor bounding box: left, top, right, bottom.
    pub bbox: (i32, i32, i32, i32),
}

impl DisplayContext {
    /// A 1:1 context for the given physical resolution.
    pub fn unscaled(width: u32, height: u32) -> Self {
        Self {
            scaling_factor: 1.0,
            resolution: (width, height),
            bbox: (0, 0, width as i32, height as i32),
        }
    }

    /// Logical resolution (physical divided by the scaling factor).
    pub fn logical_resolution(&self) -> (u32, u32) {
        let (w, h) = self.resolution;
        let scale = self.effective_scale();
        (
            (w as f64 / scale).round() as u32,
            (h as f64 / scale).round() as u32,
        )
    }

    /// Clamp a logical point onto the primary monitor.
    pub fn clamp_logical(&self, x: i32, y: i32) -> (i32, i32) {
        let (lw, lh) = self.logical_resolution();
        (
            x.clamp(0, lw.saturating_sub(1) as i32),
            y.clamp(0, lh.saturating_sub(1) as i32),
        )
    }

    /// Scaling factor guarded against zero/negative/NaN probe garbage.
    pub fn effective_scale(&self) -> f64 {
        if self.scaling_factor.is_finite() && self.scaling_factor > 0.0 {
            self.scaling_factor
        } else {
            1.0
        }
    }
}

impl Default for DisplayContext {
    fn default() -> Self {
        Self::unscaled(1920, 1080)
    }
}
