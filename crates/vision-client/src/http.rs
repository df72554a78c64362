//! reqwest-backed [`VisionModel`] speaking the OpenAI-compatible chat API.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, ImageEncoder};
use pilot_core_types::Frame;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::VisionModel;

/// Lossy-but-high-quality frame encoding for the wire.
const JPEG_QUALITY: u8 = 95;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("missing vision API key")]
    MissingApiKey,

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub api_key: String,
    pub api_base: String,
    /// Tried in order; a fast model first, then a capable one.
    pub models: Vec<String>,
    /// Low temperature keeps structured outputs parseable.
    pub temperature: f32,
    pub timeout: Duration,
}

impl VisionConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: "https://api.openai.com/v1".to_string(),
            models: vec!["gpt-4o-mini".to_string(), "gpt-4o".to_string()],
            temperature: 0.1,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }
}

/// Multimodal client with per-call model fallback.
#[derive(Debug)]
pub struct HttpVisionClient {
    client: Client,
    config: VisionConfig,
}

impl HttpVisionClient {
    pub fn new(config: VisionConfig) -> Result<Self, VisionError> {
        if config.api_key.is_empty() {
            return Err(VisionError::MissingApiKey);
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| VisionError::ClientBuild(err.to_string()))?;
        Ok(Self { client, config })
    }

    async fn query_model(&self, model: &str, data_url: &str, prompt: &str) -> Option<String> {
        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        let body = ChatRequest {
            model,
            temperature: self.config.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text { text: prompt },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: data_url.to_string(),
                        },
                    },
                ],
            }],
        };

        let response = match self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(model, error = %err, "vision request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(model, %status, body = %text, "vision endpoint rejected request");
            return None;
        }

        let parsed: ChatResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(model, error = %err, "vision response was not valid JSON");
                return None;
            }
        };

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);
        match content {
            Some(content) if !content.is_empty() => {
                debug!(model, chars = content.len(), "vision reply received");
                Some(content)
            }
            _ => {
                warn!(model, "vision reply had no content");
                None
            }
        }
    }
}

#[async_trait]
impl VisionModel for HttpVisionClient {
    async fn query(
        &self,
        frame: &Frame,
        prompt: &str,
        preference: Option<&[String]>,
    ) -> Option<String> {
        let encoded = match encode_frame(frame) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(error = %err, "frame encoding failed");
                return None;
            }
        };
        let data_url = format!("data:image/jpeg;base64,{}", BASE64.encode(&encoded));

        let models = preference.unwrap_or(&self.config.models);
        for model in models {
            if let Some(reply) = self.query_model(model, &data_url, prompt).await {
                return Some(reply);
            }
            warn!(model, "falling through to next vision model");
        }
        None
    }
}

/// Encode the raw RGB frame as JPEG in memory; no temp files on the hot path.
fn encode_frame(frame: &Frame) -> Result<Vec<u8>, String> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
    encoder
        .write_image(&frame.data, frame.width, frame.height, ColorType::Rgb8)
        .map_err(|err| err.to_string())?;
    Ok(buffer)
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
