//! Browser driver: a persistent-profile Chromium session behind the
//! [`BrowserControl`] seam.
//!
//! One page, one operation at a time. The real implementation speaks CDP via
//! chromiumoxide; [`fake::FakeBrowser`] provides a deterministic double for
//! tests higher up the stack.

pub mod chromium;
pub mod control;
pub mod errors;
pub mod fake;
mod snapshot;
mod util;

pub use chromium::{ChromiumDriver, DriverConfig};
pub use control::BrowserControl;
pub use errors::DriverError;
