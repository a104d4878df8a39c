//! GenCraft Core Library
//!
//! Data model, prompt templates, shape validation and the generation stage
//! used by the pipeline crates.

pub mod catalog;
pub mod domain;
pub mod fakes;
pub mod generation;
pub mod obs;
pub mod schema;
pub mod stage;
pub mod telemetry;
pub mod template;

pub use catalog::{
    AdviceInput, AdvisedCodeInput, CodeInput, IdeaInput, ImageInput, InsightsInput, ReviewInput,
    StageCatalog,
};
pub use domain::{
    ConceptualImage, FilePathError, FlowchartSvg, GeneratedFile, GeneratedFileSet, GencraftError,
    ProjectIdea, ProjectInsights, ProjectPlan, Result, StageKind, StrategicAdvice, ThemeColors,
    ThemePalette,
};
pub use generation::{
    GeneratedMedia, GenerationBackend, GenerationError, HarmCategory, HarmThreshold,
    ImageRequest, ResponseModality, SafetySetting, StructuredRequest,
};
pub use schema::{Field, Shape, ShapeViolation};
pub use stage::{
    FailureKind, Fallbacks, GenerationMode, GenerationStage, Inspection, StageArtifact,
    StageFailure, StageInput, StageOutcome, StageReport,
};
pub use template::{PromptFields, TemplateError, TemplateId, TRUNCATION_MARKER};

/// Crate version, checked against the workspace manifest in tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
