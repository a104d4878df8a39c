//! The parameterized generation stage.
//!
//! A [`GenerationStage`] is configured with a template, an output type (which
//! carries its shape), safety settings, two fallback constructors and a
//! field truncation limit. [`GenerationStage::run`] renders the prompt, makes
//! exactly one external call, validates the reply and always hands back an
//! output: internally every step returns `Result`, and the failure is
//! collapsed into a fallback value at the end.

use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::domain::{sha256_hex, StageKind};
use crate::generation::{
    GenerationBackend, GenerationError, ImageRequest, ResponseModality, SafetySetting,
    StructuredRequest,
};
use crate::schema::{self, Shape, ShapeViolation};
use crate::template::{self, PromptFields, TemplateError, TemplateId};

/// Result of a post-validation check on a decoded artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inspection {
    Complete,
    /// Blank fields were replaced with defaults; names are reported.
    Defaulted(Vec<&'static str>),
    /// The value matched its shape but cannot be used.
    Unusable(&'static str),
}

impl Inspection {
    pub fn from_defaulted(fields: Vec<&'static str>) -> Self {
        if fields.is_empty() {
            Inspection::Complete
        } else {
            Inspection::Defaulted(fields)
        }
    }
}

/// An output type a stage can produce.
pub trait StageArtifact: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Shape the raw reply must match before decoding.
    fn shape() -> Shape;

    /// Substitute per-field defaults or reject an unusable value.
    fn inspect(&mut self) -> Inspection {
        Inspection::Complete
    }
}

/// Supplies the named fields a stage's template consumes.
pub trait StageInput {
    fn fields(&self) -> PromptFields;
}

impl StageInput for PromptFields {
    fn fields(&self) -> PromptFields {
        self.clone()
    }
}

/// Which capability method a stage calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    Structured,
    Image,
}

/// Fallback constructors for a stage.
pub struct Fallbacks<O> {
    /// Used when the external call (or prompt rendering) fails; receives the error text.
    pub on_error: fn(&str) -> O,
    /// Used when the reply does not match its shape, and for unusable replies
    /// unless the stage sets its own empty fallback.
    pub on_invalid: fn() -> O,
}

impl<O> Clone for Fallbacks<O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<O> Copy for Fallbacks<O> {}

impl<O> std::fmt::Debug for Fallbacks<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fallbacks").finish_non_exhaustive()
    }
}

/// Classification of a stage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    PromptRender,
    ExternalCall,
    ShapeValidation,
    EmptyResult,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::PromptRender => "prompt_render",
            FailureKind::ExternalCall => "external_call",
            FailureKind::ShapeValidation => "shape_validation",
            FailureKind::EmptyResult => "empty_result",
        };
        f.write_str(s)
    }
}

/// Why a stage fell back. Never escapes [`GenerationStage::run`].
#[derive(Debug, thiserror::Error)]
pub enum StageFailure {
    #[error("prompt rendering failed: {0}")]
    Template(#[from] TemplateError),

    #[error("external call failed: {0}")]
    External(#[from] GenerationError),

    #[error("output did not match its shape: {0}")]
    Shape(#[from] ShapeViolation),

    #[error("output could not be decoded: {0}")]
    Decode(String),

    #[error("output was unusable: {0}")]
    EmptyResult(&'static str),
}

impl StageFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            StageFailure::Template(_) => FailureKind::PromptRender,
            StageFailure::External(_) => FailureKind::ExternalCall,
            StageFailure::Shape(_) | StageFailure::Decode(_) => FailureKind::ShapeValidation,
            StageFailure::EmptyResult(_) => FailureKind::EmptyResult,
        }
    }
}

/// How a stage's output came about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageOutcome {
    Generated,
    Defaulted { fields: Vec<String> },
    Fallback { failure: FailureKind, detail: String },
}

/// Output of one stage run plus what happened.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport<O> {
    pub stage: StageKind,
    pub output: O,
    #[serde(flatten)]
    pub outcome: StageOutcome,
    /// SHA-256 of the rendered prompt; absent when rendering failed.
    pub prompt_digest: Option<String>,
    pub duration_ms: u64,
}

impl<O> StageReport<O> {
    /// Generated or defaulted output; fallbacks are not usable downstream.
    pub fn is_usable(&self) -> bool {
        !matches!(self.outcome, StageOutcome::Fallback { .. })
    }

    pub fn failure(&self) -> Option<FailureKind> {
        match &self.outcome {
            StageOutcome::Fallback { failure, .. } => Some(*failure),
            _ => None,
        }
    }
}

/// One configured stage.
#[derive(Debug, Clone)]
pub struct GenerationStage<O> {
    kind: StageKind,
    template: TemplateId,
    mode: GenerationMode,
    safety: Vec<SafetySetting>,
    fallbacks: Fallbacks<O>,
    on_empty: Option<fn() -> O>,
    max_field_chars: usize,
}

impl<O: StageArtifact> GenerationStage<O> {
    pub fn structured(
        kind: StageKind,
        template: TemplateId,
        safety: Vec<SafetySetting>,
        fallbacks: Fallbacks<O>,
    ) -> Self {
        Self {
            kind,
            template,
            mode: GenerationMode::Structured,
            safety,
            fallbacks,
            on_empty: None,
            max_field_chars: template.max_field_chars(),
        }
    }

    pub fn image(
        kind: StageKind,
        template: TemplateId,
        safety: Vec<SafetySetting>,
        fallbacks: Fallbacks<O>,
    ) -> Self {
        Self {
            mode: GenerationMode::Image,
            ..Self::structured(kind, template, safety, fallbacks)
        }
    }

    /// Override the template's default field truncation limit.
    pub fn with_field_limit(mut self, max_field_chars: usize) -> Self {
        self.max_field_chars = max_field_chars;
        self
    }

    /// Use `on_empty` instead of the invalid fallback when the reply parses
    /// but carries nothing usable.
    pub fn with_empty_fallback(mut self, on_empty: fn() -> O) -> Self {
        self.on_empty = Some(on_empty);
        self
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn template(&self) -> TemplateId {
        self.template
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    pub fn max_field_chars(&self) -> usize {
        self.max_field_chars
    }

    pub fn safety(&self) -> &[SafetySetting] {
        &self.safety
    }

    pub fn error_fallback(&self, detail: &str) -> O {
        (self.fallbacks.on_error)(detail)
    }

    pub fn invalid_fallback(&self) -> O {
        (self.fallbacks.on_invalid)()
    }

    pub fn empty_fallback(&self) -> O {
        match self.on_empty {
            Some(on_empty) => on_empty(),
            None => self.invalid_fallback(),
        }
    }

    pub fn render_prompt<I: StageInput + ?Sized>(&self, input: &I) -> Result<String, TemplateError> {
        template::build_with_limit(self.template, &input.fields(), self.max_field_chars)
    }

    /// Run the stage once. Never fails: any error becomes a fallback output.
    pub async fn run<I: StageInput + ?Sized>(
        &self,
        backend: &dyn GenerationBackend,
        input: &I,
    ) -> StageReport<O> {
        let start = Instant::now();

        let (prompt_digest, result) = match self.render_prompt(input) {
            Ok(prompt) => {
                let digest = sha256_hex(&prompt);
                (Some(digest), self.attempt(backend, prompt).await)
            }
            Err(e) => (None, Err(StageFailure::from(e))),
        };

        let duration_ms = start.elapsed().as_millis() as u64;

        let (output, outcome) = match result {
            Ok((output, defaulted)) if defaulted.is_empty() => {
                info!(stage = %self.kind, duration_ms, "stage output generated");
                (output, StageOutcome::Generated)
            }
            Ok((output, defaulted)) => {
                warn!(
                    stage = %self.kind,
                    fields = ?defaulted,
                    "stage output had blank fields, defaults substituted"
                );
                (
                    output,
                    StageOutcome::Defaulted {
                        fields: defaulted.into_iter().map(str::to_string).collect(),
                    },
                )
            }
            Err(failure) => {
                let kind = failure.kind();
                let detail = failure.to_string();
                let output = match kind {
                    FailureKind::ExternalCall | FailureKind::PromptRender => {
                        error!(stage = %self.kind, failure = %kind, error = %detail, "stage failed, using error fallback");
                        self.error_fallback(&detail)
                    }
                    FailureKind::ShapeValidation => {
                        warn!(stage = %self.kind, failure = %kind, reason = %detail, "stage output invalid, using fallback");
                        self.invalid_fallback()
                    }
                    FailureKind::EmptyResult => {
                        warn!(stage = %self.kind, failure = %kind, reason = %detail, "stage output unusable, using fallback");
                        self.empty_fallback()
                    }
                };
                (
                    output,
                    StageOutcome::Fallback {
                        failure: kind,
                        detail,
                    },
                )
            }
        };

        StageReport {
            stage: self.kind,
            output,
            outcome,
            prompt_digest,
            duration_ms,
        }
    }

    async fn attempt(
        &self,
        backend: &dyn GenerationBackend,
        prompt: String,
    ) -> Result<(O, Vec<&'static str>), StageFailure> {
        let value = match self.mode {
            GenerationMode::Structured => {
                backend
                    .generate_structured(StructuredRequest {
                        stage: self.kind,
                        prompt,
                        shape: O::shape(),
                        safety: self.safety.clone(),
                    })
                    .await?
            }
            GenerationMode::Image => {
                let media = backend
                    .generate_image(ImageRequest {
                        stage: self.kind,
                        prompt,
                        modalities: vec![ResponseModality::Text, ResponseModality::Image],
                        safety: self.safety.clone(),
                    })
                    .await?;
                Value::String(media.url.unwrap_or_default())
            }
        };

        schema::validate(&value, &O::shape())?;
        let mut output: O =
            serde_json::from_value(value).map_err(|e| StageFailure::Decode(e.to_string()))?;

        match output.inspect() {
            Inspection::Complete => Ok((output, Vec::new())),
            Inspection::Defaulted(fields) => Ok((output, fields)),
            Inspection::Unusable(reason) => Err(StageFailure::EmptyResult(reason)),
        }
    }
}
