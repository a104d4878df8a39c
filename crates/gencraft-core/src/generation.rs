//! The external generation capability.
//!
//! Stages talk to the hosted model only through [`GenerationBackend`]. The
//! HTTP implementation lives in `gencraft-gemini`; tests use
//! [`crate::fakes::ScriptedBackend`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::StageKind;
use crate::schema::Shape;

/// Harm categories a safety threshold can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmThreshold {
    BlockLowAndAbove,
    BlockMediumAndAbove,
    BlockOnlyHigh,
    BlockNone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmThreshold,
}

impl SafetySetting {
    pub const fn new(category: HarmCategory, threshold: HarmThreshold) -> Self {
        Self {
            category,
            threshold,
        }
    }
}

/// Output modalities requested from the image model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseModality {
    Text,
    Image,
}

/// A prompt plus the shape the reply must have.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub stage: StageKind,
    pub prompt: String,
    pub shape: Shape,
    pub safety: Vec<SafetySetting>,
}

/// A prompt for the image model.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub stage: StageKind,
    pub prompt: String,
    pub modalities: Vec<ResponseModality>,
    pub safety: Vec<SafetySetting>,
}

/// Media returned by the image model. `url` is expected to be a data URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedMedia {
    pub url: Option<String>,
    pub content_type: Option<String>,
}

impl GeneratedMedia {
    pub fn data_uri(content_type: &str, base64: &str) -> Self {
        Self {
            url: Some(format!("data:{content_type};base64,{base64}")),
            content_type: Some(content_type.to_string()),
        }
    }
}

/// Failures of the external capability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("model API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("response blocked: {reason}")]
    Blocked { reason: String },

    #[error("could not decode model response: {0}")]
    Decode(String),

    #[error("generation backend unavailable: {0}")]
    Unavailable(String),
}

/// The single generation capability every stage calls through.
///
/// Implementations perform exactly one external call per method invocation
/// and never retry.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate a JSON value (or a bare string) for a structured stage.
    async fn generate_structured(&self, request: StructuredRequest) -> Result<Value, GenerationError>;

    /// Generate an image for the conceptual mockup stage.
    async fn generate_image(&self, request: ImageRequest) -> Result<GeneratedMedia, GenerationError>;
}
