//! `generateContent` request and response types, and decoding of
//! candidates into stage values.

use gencraft_core::{GeneratedMedia, ResponseModality, SafetySetting, Shape};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GeminiError, Result};

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextPart {
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<ResponseModality>>,
}

fn user_prompt(prompt: String) -> Vec<Content> {
    vec![Content {
        role: "user".to_string(),
        parts: vec![TextPart { text: prompt }],
    }]
}

/// Request for a structured stage. Object and array shapes ask for JSON
/// constrained by a response schema; string shapes ask for plain text.
pub fn structured_request(
    prompt: String,
    shape: &Shape,
    safety: &[SafetySetting],
) -> GenerateContentRequest {
    let generation_config = match shape {
        Shape::String => None,
        Shape::Array(_) | Shape::Object(_) => Some(GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(shape.to_response_schema()),
            ..GenerationConfig::default()
        }),
    };
    GenerateContentRequest {
        contents: user_prompt(prompt),
        generation_config,
        safety_settings: safety.to_vec(),
    }
}

pub fn image_request(
    prompt: String,
    modalities: &[ResponseModality],
    safety: &[SafetySetting],
) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: user_prompt(prompt),
        generation_config: Some(GenerationConfig {
            response_modalities: Some(modalities.to_vec()),
            ..GenerationConfig::default()
        }),
        safety_settings: safety.to_vec(),
    }
}

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    pub text: Option<String>,
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

const BLOCKING_FINISH_REASONS: [&str; 4] = ["SAFETY", "BLOCKLIST", "PROHIBITED_CONTENT", "SPII"];

/// Message from a Google API error body, or the raw body when it has none.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

impl GenerateContentResponse {
    /// Parts of the first candidate.
    pub fn into_parts(self) -> Result<Vec<ResponsePart>> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(GeminiError::Blocked(reason));
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or(GeminiError::EmptyResponse)?;

        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
        if parts.is_empty() {
            return match candidate.finish_reason {
                Some(reason) if BLOCKING_FINISH_REASONS.contains(&reason.as_str()) => {
                    Err(GeminiError::Blocked(reason))
                }
                _ => Err(GeminiError::EmptyResponse),
            };
        }
        Ok(parts)
    }
}

/// Strip a surrounding markdown code fence (```json ... ```), if any.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`, `xml`, ...) on the opening line.
    match body.split_once('\n') {
        Some((info, content)) if info.trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            content.trim()
        }
        _ => body.trim(),
    }
}

fn concat_text(parts: &[ResponsePart]) -> String {
    parts.iter().filter_map(|p| p.text.as_deref()).collect()
}

/// Turn candidate parts into the value a structured stage validates.
///
/// String shapes take the text as-is (or unwrap it if the model returned a
/// JSON string literal). Other shapes parse the text as JSON; a response
/// that is not JSON is a decode error.
pub fn decode_structured(parts: &[ResponsePart], shape: &Shape) -> Result<Value> {
    let text = concat_text(parts);
    match shape {
        Shape::String => match serde_json::from_str::<Value>(text.trim()) {
            Ok(Value::String(inner)) => Ok(Value::String(inner)),
            _ => Ok(Value::String(text)),
        },
        Shape::Array(_) | Shape::Object(_) => serde_json::from_str(strip_code_fence(&text))
            .map_err(|e| GeminiError::Decode(format!("candidate text is not JSON: {e}"))),
    }
}

/// First inline image as a data URI. Text parts are ignored.
pub fn decode_media(parts: &[ResponsePart]) -> GeneratedMedia {
    parts
        .iter()
        .find_map(|p| p.inline_data.as_ref())
        .map(|inline| GeneratedMedia::data_uri(&inline.mime_type, &inline.data))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gencraft_core::{Field, HarmCategory, HarmThreshold};
    use serde_json::json;

    fn response(value: Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    fn text_parts(text: &str) -> Vec<ResponsePart> {
        vec![ResponsePart {
            text: Some(text.to_string()),
            inline_data: None,
        }]
    }

    #[test]
    fn test_structured_request_for_object_shape() {
        let shape = Shape::object([Field::required("milestone1", Shape::String)]);
        let safety = [SafetySetting::new(
            HarmCategory::DangerousContent,
            HarmThreshold::BlockMediumAndAbove,
        )];
        let body = serde_json::to_value(structured_request("plan it".into(), &shape, &safety)).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "plan it");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
        assert_eq!(body["safetySettings"][0]["category"], "HARM_CATEGORY_DANGEROUS_CONTENT");
        assert_eq!(body["safetySettings"][0]["threshold"], "BLOCK_MEDIUM_AND_ABOVE");
    }

    #[test]
    fn test_structured_request_for_string_shape_has_no_config() {
        let body = serde_json::to_value(structured_request("svg".into(), &Shape::String, &[])).unwrap();
        assert!(body.get("generationConfig").is_none());
        assert!(body.get("safetySettings").is_none());
    }

    #[test]
    fn test_image_request_modalities() {
        let body = serde_json::to_value(image_request(
            "draw".into(),
            &[ResponseModality::Text, ResponseModality::Image],
            &[],
        ))
        .unwrap();
        assert_eq!(
            body["generationConfig"]["responseModalities"],
            json!(["TEXT", "IMAGE"])
        );
        assert!(body["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_prompt_block_is_reported() {
        let err = response(json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
            .into_parts()
            .unwrap_err();
        assert_eq!(err, GeminiError::Blocked("SAFETY".to_string()));
    }

    #[test]
    fn test_candidate_block_and_empty() {
        let err = response(json!({ "candidates": [{ "finishReason": "SAFETY" }] }))
            .into_parts()
            .unwrap_err();
        assert_eq!(err, GeminiError::Blocked("SAFETY".to_string()));

        let err = response(json!({ "candidates": [] })).into_parts().unwrap_err();
        assert_eq!(err, GeminiError::EmptyResponse);

        let err = response(json!({ "candidates": [{ "content": { "parts": [] }, "finishReason": "STOP" }] }))
            .into_parts()
            .unwrap_err();
        assert_eq!(err, GeminiError::EmptyResponse);
    }

    #[test]
    fn test_parts_of_first_candidate() {
        let parts = response(json!({
            "candidates": [
                { "content": { "role": "model", "parts": [{ "text": "{\"a\":" }, { "text": "\"b\"}" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .into_parts()
        .unwrap();
        let shape = Shape::object([Field::required("a", Shape::String)]);
        assert_eq!(decode_structured(&parts, &shape).unwrap(), json!({ "a": "b" }));
    }

    #[test]
    fn test_code_fence_stripped() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fence("```{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn test_string_shape_takes_raw_text() {
        let value = decode_structured(&text_parts("<svg></svg>"), &Shape::String).unwrap();
        assert_eq!(value, json!("<svg></svg>"));

        let value = decode_structured(&text_parts("\"<svg></svg>\""), &Shape::String).unwrap();
        assert_eq!(value, json!("<svg></svg>"));
    }

    #[test]
    fn test_object_shape_rejects_prose() {
        let shape = Shape::object([Field::required("a", Shape::String)]);
        let err = decode_structured(&text_parts("Sure! Here is your plan."), &shape).unwrap_err();
        assert!(matches!(err, GeminiError::Decode(_)));
    }

    #[test]
    fn test_media_decoding() {
        let parts = response(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "Here is a mockup." },
                { "inlineData": { "mimeType": "image/png", "data": "iVBORw0KGgo=" } }
            ] } }]
        }))
        .into_parts()
        .unwrap();
        assert_eq!(
            decode_media(&parts).url.as_deref(),
            Some("data:image/png;base64,iVBORw0KGgo=")
        );
        assert_eq!(decode_media(&text_parts("no image")), GeneratedMedia::default());
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body), "API key not valid.");
        assert_eq!(error_message(" upstream connect error \n"), "upstream connect error");
    }
}
