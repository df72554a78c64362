//! OS-level input: logical-coordinate clicks and paced keyboard typing.
//!
//! Coordinates entering this crate are logical screen pixels; the gateway has
//! already translated CSS pixels through the display scaling factor. The
//! driver clamps to the primary monitor as a second line of defense.

use async_trait::async_trait;
use enigo::{Button, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};
use parking_lot::Mutex;
use pilot_core_types::DisplayContext;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("input backend unavailable: {0}")]
    Unavailable(String),

    #[error("input injection failed: {0}")]
    Injection(String),
}

/// Seam for synthetic pointer and keyboard input.
#[async_trait]
pub trait InputDriver: Send + Sync {
    /// Click at logical coordinates on the primary monitor.
    async fn click(&self, x: i32, y: i32) -> Result<(), InputError>;

    /// Type text into whatever currently holds focus.
    async fn type_text(&self, text: &str) -> Result<(), InputError>;
}

/// enigo-backed implementation.
pub struct EnigoInput {
    enigo: Mutex<Enigo>,
    display: DisplayContext,
    /// Pause before acting so window focus settles.
    settle: Duration,
    /// Delay between keystrokes, human pacing.
    key_delay: Duration,
}

impl EnigoInput {
    pub fn new(display: DisplayContext) -> Result<Self, InputError> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|err| InputError::Unavailable(err.to_string()))?;
        Ok(Self {
            enigo: Mutex::new(enigo),
            display,
            settle: Duration::from_millis(250),
            key_delay: Duration::from_millis(30),
        })
    }
}

#[async_trait]
impl InputDriver for EnigoInput {
    async fn click(&self, x: i32, y: i32) -> Result<(), InputError> {
        let (cx, cy) = self.display.clamp_logical(x, y);
        if (cx, cy) != (x, y) {
            warn!(x, y, cx, cy, "click clamped to primary monitor");
        }
        tokio::time::sleep(self.settle).await;

        let mut enigo = self.enigo.lock();
        enigo
            .move_mouse(cx, cy, Coordinate::Abs)
            .map_err(|err| InputError::Injection(err.to_string()))?;
        enigo
            .button(Button::Left, Direction::Click)
            .map_err(|err| InputError::Injection(err.to_string()))?;
        debug!(x = cx, y = cy, "mouse clicked");
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), InputError> {
        tokio::time::sleep(self.settle).await;
        for ch in text.chars() {
            {
                let mut enigo = self.enigo.lock();
                enigo
                    .text(&ch.to_string())
                    .map_err(|err| InputError::Injection(err.to_string()))?;
            }
            tokio::time::sleep(self.key_delay).await;
        }
        debug!(chars = text.chars().count(), "text typed");
        Ok(())
    }
}

/// Test double that records every injected event.
#[derive(Default)]
pub struct RecordingInput {
    clicks: Mutex<Vec<(i32, i32)>>,
    typed: Mutex<Vec<String>>,
}

impl RecordingInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clicks(&self) -> Vec<(i32, i32)> {
        self.clicks.lock().clone()
    }

    pub fn typed(&self) -> Vec<String> {
        self.typed.lock().clone()
    }
}

#[async_trait]
impl InputDriver for RecordingInput {
    async fn click(&self, x: i32, y: i32) -> Result<(), InputError> {
        self.clicks.lock().push((x, y));
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), InputError> {
        self.typed.lock().push(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_input_captures_events() {
        let input = RecordingInput::new();
        input.click(440, 176).await.unwrap();
        input.type_text("hello").await.unwrap();

        assert_eq!(input.clicks(), vec![(440, 176)]);
        assert_eq!(input.typed(), vec!["hello".to_string()]);
    }
}
