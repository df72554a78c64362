//! Perception snapshot types: raw frames and the filtered DOM.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A raw RGB frame of the primary monitor, in physical pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGB8, row-major, `width * height * 3` bytes.
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width as usize) * (height as usize) * 3);
        Self {
            width,
            height,
            data,
        }
    }

    /// A uniformly filled frame; handy for tests and placeholder captures.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity((width as usize) * (height as usize) * 3);
        for _ in 0..(width as usize) * (height as usize) {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }
}

/// Bounding box in CSS pixels of the browser viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Center point in CSS pixels.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// One interactive element from the filtered DOM snapshot.
///
/// Capture keeps only elements with a positive on-viewport box, and only the
/// small attribute set the model needs to build selectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomNode {
    pub tag: String,
    /// Inner text, trimmed to a bounded length at capture time.
    pub text: String,
    /// Present attributes only, from: id, class, role, aria-label,
    /// data-testid, name, placeholder.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub rect: Rect,
}

/// What the brain saw at one instant: pixels plus the matching DOM.
#[derive(Debug, Clone, PartialEq)]
pub struct PerceptionSnapshot {
    pub frame: Frame,
    /// Empty when no browser page is live.
    pub dom_elements: Vec<DomNode>,
    /// Fingerprint of `frame` used for cheap change detection.
    pub content_hash: String,
    pub captured_at: DateTime<Utc>,
}
