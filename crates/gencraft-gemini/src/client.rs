//! HTTP client for the Gemini `generateContent` endpoint

use std::sync::Arc;

use async_trait::async_trait;
use gencraft_core::{
    GeneratedMedia, GenerationBackend, GenerationError, ImageRequest, StructuredRequest,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::GeminiConfig;
use crate::error::{GeminiError, Result};
use crate::wire::{self, GenerateContentRequest, GenerateContentResponse, ResponsePart};

/// Generation backend that calls Gemini over HTTPS.
///
/// One request per call. No retries; the only timeout is the one in
/// [`GeminiConfig`].
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    config: Arc<GeminiConfig>,
    http: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("gencraft/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;

        Ok(GeminiBackend {
            config: Arc::new(config),
            http,
        })
    }

    /// Create a backend from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    async fn generate_content(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<Vec<ResponsePart>> {
        let url = self.config.endpoint(model);
        debug!(model = %model, "calling generateContent");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", self.config.api_key())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = wire::error_message(&body);
            warn!(model = %model, status = status.as_u16(), "Gemini API error");
            return Err(GeminiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        parsed.into_parts()
    }

    /// Structured generation returning the stage's raw value.
    pub async fn structured(&self, request: StructuredRequest) -> Result<Value> {
        let body = wire::structured_request(request.prompt, &request.shape, &request.safety);
        let parts = self.generate_content(&self.config.text_model, &body).await?;
        wire::decode_structured(&parts, &request.shape)
    }

    pub async fn image(&self, request: ImageRequest) -> Result<GeneratedMedia> {
        let body = wire::image_request(request.prompt, &request.modalities, &request.safety);
        let parts = self.generate_content(&self.config.image_model, &body).await?;
        Ok(wire::decode_media(&parts))
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate_structured(
        &self,
        request: StructuredRequest,
    ) -> std::result::Result<Value, GenerationError> {
        self.structured(request).await.map_err(GenerationError::from)
    }

    async fn generate_image(
        &self,
        request: ImageRequest,
    ) -> std::result::Result<GeneratedMedia, GenerationError> {
        self.image(request).await.map_err(GenerationError::from)
    }
}
