//! Vision-language client: one multimodal query seam with model fallback.
//!
//! The runtime talks to whatever OpenAI-compatible chat endpoint the
//! deployment points it at. Exhausting every candidate model is not an error
//! here; callers treat a missing reply as the model answering `FAIL`/`No`.

pub mod extract;
pub mod http;
pub mod scripted;

use async_trait::async_trait;
use pilot_core_types::Frame;

pub use extract::extract_json;
pub use http::{HttpVisionClient, VisionConfig, VisionError};
pub use scripted::ScriptedVision;

/// Seam for multimodal queries.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Send `prompt` together with the frame. `preference` overrides the
    /// configured model fallback list for this call. `None` means every
    /// candidate failed.
    async fn query(
        &self,
        frame: &Frame,
        prompt: &str,
        preference: Option<&[String]>,
    ) -> Option<String>;
}
