use std::time::Duration;
use thiserror::Error;

/// Errors emitted by the browser driver.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The browser process could not be started or configured.
    #[error("browser launch failed: {0}")]
    Launch(String),

    /// No element matched the selector.
    #[error("no element matches selector '{0}'")]
    ElementNotFound(String),

    /// The underlying protocol call failed (includes page crashes).
    #[error("browser protocol error: {0}")]
    Protocol(String),

    /// The operation exceeded its per-call deadline.
    #[error("browser operation timed out after {0:?}")]
    Timeout(Duration),

    /// The driver was asked to act after `close`.
    #[error("browser session is closed")]
    Closed,
}

impl DriverError {
    pub fn protocol(err: impl std::fmt::Display) -> Self {
        Self::Protocol(err.to_string())
    }
}
