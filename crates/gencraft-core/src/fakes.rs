//! In-memory generation backend (testing only)
//!
//! `ScriptedBackend` answers each stage from a per-stage queue of scripted
//! replies and records every prompt it receives. Stages with an empty queue
//! get a valid canned reply, so tests only script what they care about.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::domain::StageKind;
use crate::generation::{
    GeneratedMedia, GenerationBackend, GenerationError, ImageRequest, StructuredRequest,
};

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Returned as-is from `generate_structured`; a string becomes the media URL for images.
    Value(Value),
    Media(GeneratedMedia),
    Error(GenerationError),
}

/// A prompt the backend was asked to generate from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub stage: StageKind,
    pub prompt: String,
}

#[derive(Debug, Default)]
pub struct ScriptedBackend {
    replies: Mutex<HashMap<StageKind, VecDeque<ScriptedReply>>>,
    delays: HashMap<StageKind, Duration>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next call to `stage`.
    pub fn with_reply(self, stage: StageKind, reply: ScriptedReply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(stage)
            .or_default()
            .push_back(reply);
        self
    }

    pub fn with_value(self, stage: StageKind, value: Value) -> Self {
        self.with_reply(stage, ScriptedReply::Value(value))
    }

    pub fn with_error(self, stage: StageKind, error: GenerationError) -> Self {
        self.with_reply(stage, ScriptedReply::Error(error))
    }

    /// Sleep before answering every call to `stage`.
    pub fn with_delay(mut self, stage: StageKind, delay: Duration) -> Self {
        self.delays.insert(stage, delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, stage: StageKind) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.stage == stage)
            .cloned()
            .collect()
    }

    /// Stages called so far, in call order.
    pub fn called_stages(&self) -> Vec<StageKind> {
        self.calls.lock().unwrap().iter().map(|c| c.stage).collect()
    }

    /// Valid reply used when nothing is scripted for `stage`.
    pub fn default_reply(stage: StageKind) -> ScriptedReply {
        match stage {
            StageKind::Plan => ScriptedReply::Value(json!({
                "milestone1": "Scaffold the project and core data model",
                "milestone2": "Build the main user flows",
                "milestone3": "Polish, test and deploy"
            })),
            StageKind::Flowchart => ScriptedReply::Value(json!(
                "<svg viewBox=\"0 0 600 400\" xmlns=\"http://www.w3.org/2000/svg\"><rect x=\"50\" y=\"50\" width=\"120\" height=\"60\" /></svg>"
            )),
            StageKind::Code => ScriptedReply::Value(json!({
                "files": [
                    {
                        "fileName": "src/app/page.tsx",
                        "fileContent": "export default function HomePage() { return <main>Hello</main>; }"
                    }
                ],
                "globalStyles": "/* Tailwind CSS utilities will be primarily used. */"
            })),
            StageKind::Image => {
                ScriptedReply::Media(GeneratedMedia::data_uri("image/png", "iVBORw0KGgo="))
            }
            StageKind::Insights => ScriptedReply::Value(json!({
                "estimatedComplexity": "Medium",
                "suggestedKeywords": ["react", "dashboard"],
                "funFactOrTip": "Memoize expensive selectors."
            })),
            StageKind::Advice | StageKind::Review => ScriptedReply::Value(json!({
                "keyConsideration": "Keep the first release small.",
                "nextStepSuggestion": "Interview five target users.",
                "potentialChallenge": "Scope creep.",
                "longTermThought": "Plan for a public API."
            })),
            StageKind::Theme => ScriptedReply::Value(json!({
                "lightTheme": {
                    "background": "0 0% 100%",
                    "foreground": "222 47% 11%",
                    "primary": "200 80% 45%",
                    "accent": "35 90% 55%"
                }
            })),
        }
    }

    async fn next_reply(&self, stage: StageKind, prompt: String) -> ScriptedReply {
        self.calls
            .lock()
            .unwrap()
            .push(RecordedCall { stage, prompt });

        if let Some(delay) = self.delays.get(&stage) {
            tokio::time::sleep(*delay).await;
        }

        let scripted = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&stage)
            .and_then(VecDeque::pop_front);
        scripted.unwrap_or_else(|| Self::default_reply(stage))
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate_structured(
        &self,
        request: StructuredRequest,
    ) -> Result<Value, GenerationError> {
        match self.next_reply(request.stage, request.prompt).await {
            ScriptedReply::Value(value) => Ok(value),
            ScriptedReply::Media(media) => Ok(media.url.map(Value::String).unwrap_or(Value::Null)),
            ScriptedReply::Error(error) => Err(error),
        }
    }

    async fn generate_image(&self, request: ImageRequest) -> Result<GeneratedMedia, GenerationError> {
        match self.next_reply(request.stage, request.prompt).await {
            ScriptedReply::Media(media) => Ok(media),
            ScriptedReply::Value(Value::String(url)) => Ok(GeneratedMedia {
                url: Some(url),
                content_type: None,
            }),
            ScriptedReply::Value(_) => Ok(GeneratedMedia::default()),
            ScriptedReply::Error(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Shape;

    fn request(stage: StageKind) -> StructuredRequest {
        StructuredRequest {
            stage,
            prompt: format!("prompt for {stage}"),
            shape: Shape::String,
            safety: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_scripted_replies_are_consumed_in_order() {
        let backend = ScriptedBackend::new()
            .with_value(StageKind::Flowchart, json!("first"))
            .with_error(
                StageKind::Flowchart,
                GenerationError::Transport("down".to_string()),
            );

        let first = backend.generate_structured(request(StageKind::Flowchart)).await;
        assert_eq!(first.unwrap(), json!("first"));

        let second = backend.generate_structured(request(StageKind::Flowchart)).await;
        assert!(matches!(second, Err(GenerationError::Transport(_))));

        let third = backend.generate_structured(request(StageKind::Flowchart)).await;
        assert!(third.unwrap().as_str().unwrap().starts_with("<svg"));
    }

    #[tokio::test]
    async fn test_calls_are_recorded() {
        let backend = ScriptedBackend::new();
        backend.generate_structured(request(StageKind::Plan)).await.unwrap();
        backend.generate_structured(request(StageKind::Advice)).await.unwrap();

        assert_eq!(backend.called_stages(), vec![StageKind::Plan, StageKind::Advice]);
        assert_eq!(backend.calls_for(StageKind::Plan)[0].prompt, "prompt for plan");
        assert!(backend.calls_for(StageKind::Code).is_empty());
    }

    #[tokio::test]
    async fn test_image_null_value_has_no_url() {
        let backend = ScriptedBackend::new().with_value(StageKind::Image, Value::Null);
        let media = backend
            .generate_image(ImageRequest {
                stage: StageKind::Image,
                prompt: String::new(),
                modalities: Vec::new(),
                safety: Vec::new(),
            })
            .await
            .unwrap();
        assert_eq!(media.url, None);
    }
}
