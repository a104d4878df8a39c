//! Error types for the Gemini backend

use gencraft_core::GenerationError;
use thiserror::Error;

/// Errors that can occur talking to the Gemini API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeminiError {
    /// Neither GEMINI_API_KEY nor GOOGLE_API_KEY is set
    #[error("Gemini API key is not configured (set GEMINI_API_KEY or GOOGLE_API_KEY)")]
    MissingApiKey,

    /// An environment variable held an unusable value
    #[error("invalid value for {key}: {value}")]
    InvalidConfig { key: &'static str, value: String },

    /// Connection, TLS or timeout failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success status from the API
    #[error("Gemini API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Prompt or candidate blocked by safety filters
    #[error("response blocked: {0}")]
    Blocked(String),

    /// Response carried no candidates or no parts
    #[error("Gemini returned no content")]
    EmptyResponse,

    /// Response body or candidate text could not be decoded
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for GeminiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GeminiError::Decode(err.to_string())
        } else {
            GeminiError::Http(err.to_string())
        }
    }
}

impl From<GeminiError> for GenerationError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::MissingApiKey | GeminiError::InvalidConfig { .. } => {
                GenerationError::Unavailable(err.to_string())
            }
            GeminiError::Http(message) => GenerationError::Transport(message),
            GeminiError::Api { status, message } => GenerationError::Api { status, message },
            GeminiError::Blocked(reason) => GenerationError::Blocked { reason },
            GeminiError::EmptyResponse => GenerationError::Decode(err.to_string()),
            GeminiError::Decode(message) => GenerationError::Decode(message),
        }
    }
}

/// Result type for Gemini operations
pub type Result<T> = std::result::Result<T, GeminiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_onto_generation_errors() {
        assert_eq!(
            GenerationError::from(GeminiError::Api {
                status: 429,
                message: "quota".to_string()
            }),
            GenerationError::Api {
                status: 429,
                message: "quota".to_string()
            }
        );
        assert!(matches!(
            GenerationError::from(GeminiError::MissingApiKey),
            GenerationError::Unavailable(_)
        ));
        assert_eq!(
            GenerationError::from(GeminiError::Blocked("SAFETY".to_string())),
            GenerationError::Blocked {
                reason: "SAFETY".to_string()
            }
        );
    }
}
