//! The built-in stages: templates, safety settings and fallbacks.

use crate::domain::artifacts::{
    DEFAULT_COMPLEXITY, DEFAULT_KEYWORDS, DEFAULT_TIP, MILESTONE_PLACEHOLDER,
};
use crate::domain::{
    ConceptualImage, FlowchartSvg, GeneratedFileSet, ProjectInsights, ProjectPlan, StageKind,
    StrategicAdvice, ThemeColors, ThemePalette,
};
use crate::generation::{HarmCategory, HarmThreshold, SafetySetting};
use crate::stage::{Fallbacks, GenerationStage, StageInput};
use crate::template::{
    PromptFields, TemplateId, FIELD_FLOWCHART, FIELD_GENERATED_CODE, FIELD_PROJECT_IDEA,
    FIELD_PROJECT_INSIGHTS, FIELD_PROJECT_PLAN, FIELD_STRATEGIC_ADVICE,
};

pub const IMAGE_ERROR_PLACEHOLDER: &str = "https://placehold.co/600x400.png?text=UI+Mockup+Error";
pub const IMAGE_INVALID_PLACEHOLDER: &str =
    "https://placehold.co/600x400.png?text=UI+Mockup+Failed";

pub const FLOWCHART_ERROR_SVG: &str = r#"<svg viewBox="0 0 600 400" xmlns="http://www.w3.org/2000/svg"><rect width="100%" height="100%" fill="hsl(var(--muted))" /><text x="50%" y="50%" dominant-baseline="middle" text-anchor="middle" fill="hsl(var(--muted-foreground))" font-family="sans-serif" font-size="16px">Flowchart Generation Error (AI failed to produce valid SVG)</text></svg>"#;
pub const FLOWCHART_INVALID_SVG: &str = r#"<svg viewBox="0 0 600 400" xmlns="http://www.w3.org/2000/svg"><rect width="100%" height="100%" fill="hsl(var(--muted))" /><text x="50%" y="50%" dominant-baseline="middle" text-anchor="middle" fill="hsl(var(--muted-foreground))" font-family="sans-serif" font-size="16px">Flowchart Not Available (AI output was invalid or empty)</text></svg>"#;

/// Flowchart stage settings. Dangerous content is not blocked.
pub fn flowchart_safety() -> Vec<SafetySetting> {
    vec![
        SafetySetting::new(HarmCategory::HateSpeech, HarmThreshold::BlockOnlyHigh),
        SafetySetting::new(HarmCategory::DangerousContent, HarmThreshold::BlockNone),
        SafetySetting::new(HarmCategory::Harassment, HarmThreshold::BlockOnlyHigh),
        SafetySetting::new(HarmCategory::SexuallyExplicit, HarmThreshold::BlockOnlyHigh),
    ]
}

pub fn text_safety() -> Vec<SafetySetting> {
    vec![
        SafetySetting::new(HarmCategory::HateSpeech, HarmThreshold::BlockOnlyHigh),
        SafetySetting::new(HarmCategory::DangerousContent, HarmThreshold::BlockMediumAndAbove),
        SafetySetting::new(HarmCategory::Harassment, HarmThreshold::BlockOnlyHigh),
        SafetySetting::new(HarmCategory::SexuallyExplicit, HarmThreshold::BlockOnlyHigh),
    ]
}

// ---------------------------------------------------------------------------
// Fallback constructors
// ---------------------------------------------------------------------------

fn plan_on_error(detail: &str) -> ProjectPlan {
    ProjectPlan {
        milestone1: format!("Project plan could not be generated: {detail}"),
        milestone2: MILESTONE_PLACEHOLDER.to_string(),
        milestone3: MILESTONE_PLACEHOLDER.to_string(),
    }
}

fn plan_on_invalid() -> ProjectPlan {
    ProjectPlan {
        milestone1: MILESTONE_PLACEHOLDER.to_string(),
        milestone2: MILESTONE_PLACEHOLDER.to_string(),
        milestone3: MILESTONE_PLACEHOLDER.to_string(),
    }
}

fn flowchart_on_error(_detail: &str) -> FlowchartSvg {
    FlowchartSvg::new(FLOWCHART_ERROR_SVG)
}

fn flowchart_on_invalid() -> FlowchartSvg {
    FlowchartSvg::new(FLOWCHART_INVALID_SVG)
}

fn code_on_error(detail: &str) -> GeneratedFileSet {
    GeneratedFileSet::error_page(
        &format!("An error occurred during code generation: {detail}"),
        &format!("Error during style generation: {detail}"),
    )
}

fn code_on_invalid() -> GeneratedFileSet {
    GeneratedFileSet::error_page(
        "Code generation failed to produce output.",
        "Error generating styles",
    )
}

fn code_on_empty() -> GeneratedFileSet {
    GeneratedFileSet::error_page("AI did not generate any files.", "Error generating styles")
}

fn image_on_error(_detail: &str) -> ConceptualImage {
    ConceptualImage::new(IMAGE_ERROR_PLACEHOLDER)
}

fn image_on_invalid() -> ConceptualImage {
    ConceptualImage::new(IMAGE_INVALID_PLACEHOLDER)
}

fn insights_on_error(_detail: &str) -> ProjectInsights {
    ProjectInsights {
        estimated_complexity: "Error".to_string(),
        suggested_keywords: Vec::new(),
        fun_fact_or_tip: "Could not generate insights due to an error.".to_string(),
    }
}

fn insights_on_invalid() -> ProjectInsights {
    ProjectInsights {
        estimated_complexity: DEFAULT_COMPLEXITY.to_string(),
        suggested_keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        fun_fact_or_tip: DEFAULT_TIP.to_string(),
    }
}

fn advice_on_error(_detail: &str) -> StrategicAdvice {
    StrategicAdvice {
        key_consideration: "Error generating key consideration.".to_string(),
        next_step_suggestion: "Error generating next step suggestion.".to_string(),
        potential_challenge: "Error generating potential challenge.".to_string(),
        long_term_thought: "Error generating long term thought.".to_string(),
    }
}

fn theme_fallback(_detail: &str) -> ThemeColors {
    ThemeColors {
        light_theme: ThemePalette::safe_default(),
    }
}

fn theme_on_invalid() -> ThemeColors {
    theme_fallback("")
}

// ---------------------------------------------------------------------------
// Stage inputs
// ---------------------------------------------------------------------------

fn fields<const N: usize>(pairs: [(&str, &str); N]) -> PromptFields {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Input for stages that only need the idea: plan, flowchart, theme.
#[derive(Debug, Clone, Copy)]
pub struct IdeaInput<'a> {
    pub idea: &'a str,
}

impl StageInput for IdeaInput<'_> {
    fn fields(&self) -> PromptFields {
        fields([(FIELD_PROJECT_IDEA, self.idea)])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CodeInput<'a> {
    pub idea: &'a str,
    pub plan: &'a str,
    pub flowchart: &'a str,
}

impl StageInput for CodeInput<'_> {
    fn fields(&self) -> PromptFields {
        fields([
            (FIELD_PROJECT_IDEA, self.idea),
            (FIELD_PROJECT_PLAN, self.plan),
            (FIELD_FLOWCHART, self.flowchart),
        ])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AdvisedCodeInput<'a> {
    pub idea: &'a str,
    pub plan: &'a str,
    pub advice: &'a str,
}

impl StageInput for AdvisedCodeInput<'_> {
    fn fields(&self) -> PromptFields {
        fields([
            (FIELD_PROJECT_IDEA, self.idea),
            (FIELD_PROJECT_PLAN, self.plan),
            (FIELD_STRATEGIC_ADVICE, self.advice),
        ])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImageInput<'a> {
    pub idea: &'a str,
    pub code: &'a str,
}

impl StageInput for ImageInput<'_> {
    fn fields(&self) -> PromptFields {
        fields([
            (FIELD_PROJECT_IDEA, self.idea),
            (FIELD_GENERATED_CODE, self.code),
        ])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InsightsInput<'a> {
    pub idea: &'a str,
    pub plan: &'a str,
    pub code: &'a str,
}

impl StageInput for InsightsInput<'_> {
    fn fields(&self) -> PromptFields {
        fields([
            (FIELD_PROJECT_IDEA, self.idea),
            (FIELD_PROJECT_PLAN, self.plan),
            (FIELD_GENERATED_CODE, self.code),
        ])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AdviceInput<'a> {
    pub idea: &'a str,
    pub plan: &'a str,
}

impl StageInput for AdviceInput<'_> {
    fn fields(&self) -> PromptFields {
        fields([
            (FIELD_PROJECT_IDEA, self.idea),
            (FIELD_PROJECT_PLAN, self.plan),
        ])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReviewInput<'a> {
    pub idea: &'a str,
    pub plan: &'a str,
    pub code: &'a str,
    pub insights: &'a str,
}

impl StageInput for ReviewInput<'_> {
    fn fields(&self) -> PromptFields {
        fields([
            (FIELD_PROJECT_IDEA, self.idea),
            (FIELD_PROJECT_PLAN, self.plan),
            (FIELD_GENERATED_CODE, self.code),
            (FIELD_PROJECT_INSIGHTS, self.insights),
        ])
    }
}

// ---------------------------------------------------------------------------
// StageCatalog
// ---------------------------------------------------------------------------

/// Every stage the pipelines can run, configured once.
#[derive(Debug, Clone)]
pub struct StageCatalog {
    pub plan: GenerationStage<ProjectPlan>,
    pub flowchart: GenerationStage<FlowchartSvg>,
    pub code_from_flowchart: GenerationStage<GeneratedFileSet>,
    pub code_from_advice: GenerationStage<GeneratedFileSet>,
    pub image: GenerationStage<ConceptualImage>,
    pub insights: GenerationStage<ProjectInsights>,
    pub advice: GenerationStage<StrategicAdvice>,
    pub review: GenerationStage<StrategicAdvice>,
    pub theme: GenerationStage<ThemeColors>,
}

impl StageCatalog {
    pub fn standard() -> Self {
        let code_fallbacks = Fallbacks {
            on_error: code_on_error,
            on_invalid: code_on_invalid,
        };
        let advice_fallbacks = Fallbacks {
            on_error: advice_on_error,
            on_invalid: StrategicAdvice::generic,
        };

        Self {
            plan: GenerationStage::structured(
                StageKind::Plan,
                TemplateId::Plan,
                Vec::new(),
                Fallbacks {
                    on_error: plan_on_error,
                    on_invalid: plan_on_invalid,
                },
            ),
            flowchart: GenerationStage::structured(
                StageKind::Flowchart,
                TemplateId::Flowchart,
                flowchart_safety(),
                Fallbacks {
                    on_error: flowchart_on_error,
                    on_invalid: flowchart_on_invalid,
                },
            ),
            code_from_flowchart: GenerationStage::structured(
                StageKind::Code,
                TemplateId::CodeFromFlowchart,
                Vec::new(),
                code_fallbacks,
            )
            .with_empty_fallback(code_on_empty),
            code_from_advice: GenerationStage::structured(
                StageKind::Code,
                TemplateId::CodeFromAdvice,
                Vec::new(),
                code_fallbacks,
            )
            .with_empty_fallback(code_on_empty),
            image: GenerationStage::image(
                StageKind::Image,
                TemplateId::Image,
                Vec::new(),
                Fallbacks {
                    on_error: image_on_error,
                    on_invalid: image_on_invalid,
                },
            ),
            insights: GenerationStage::structured(
                StageKind::Insights,
                TemplateId::Insights,
                text_safety(),
                Fallbacks {
                    on_error: insights_on_error,
                    on_invalid: insights_on_invalid,
                },
            ),
            advice: GenerationStage::structured(
                StageKind::Advice,
                TemplateId::Advice,
                text_safety(),
                advice_fallbacks,
            ),
            review: GenerationStage::structured(
                StageKind::Review,
                TemplateId::Review,
                text_safety(),
                advice_fallbacks,
            ),
            theme: GenerationStage::structured(
                StageKind::Theme,
                TemplateId::Theme,
                text_safety(),
                Fallbacks {
                    on_error: theme_fallback,
                    on_invalid: theme_on_invalid,
                },
            ),
        }
    }
}

impl Default for StageCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::ScriptedBackend;
    use crate::generation::GenerationError;
    use crate::stage::{FailureKind, StageArtifact};
    use serde_json::{json, Value};

    fn down() -> GenerationError {
        GenerationError::Transport("connection refused".to_string())
    }

    #[test]
    fn test_every_fallback_is_shape_valid() {
        fn check<O: StageArtifact>(stage: &GenerationStage<O>) {
            for value in [
                stage.error_fallback("boom"),
                stage.invalid_fallback(),
                stage.empty_fallback(),
            ] {
                let json = serde_json::to_value(&value).unwrap();
                crate::schema::validate(&json, &O::shape())
                    .unwrap_or_else(|e| panic!("{} fallback: {e}", stage.kind()));
            }
        }
        let catalog = StageCatalog::standard();
        check(&catalog.plan);
        check(&catalog.flowchart);
        check(&catalog.code_from_flowchart);
        check(&catalog.code_from_advice);
        check(&catalog.image);
        check(&catalog.insights);
        check(&catalog.advice);
        check(&catalog.review);
        check(&catalog.theme);
    }

    #[test]
    fn test_flowchart_fallbacks_are_svg() {
        assert!(FlowchartSvg::new(FLOWCHART_ERROR_SVG).looks_like_svg());
        assert!(FlowchartSvg::new(FLOWCHART_INVALID_SVG).looks_like_svg());
        assert_ne!(FLOWCHART_ERROR_SVG, FLOWCHART_INVALID_SVG);
    }

    #[test]
    fn test_safety_settings_cover_all_categories() {
        let flowchart = flowchart_safety();
        assert_eq!(flowchart.len(), 4);
        assert!(flowchart.contains(&SafetySetting::new(
            HarmCategory::DangerousContent,
            HarmThreshold::BlockNone
        )));
        let text = text_safety();
        assert!(text.contains(&SafetySetting::new(
            HarmCategory::DangerousContent,
            HarmThreshold::BlockMediumAndAbove
        )));
        assert_eq!(
            StageCatalog::standard().flowchart.safety(),
            flowchart.as_slice()
        );
    }

    #[tokio::test]
    async fn test_plan_always_has_three_milestones() {
        let catalog = StageCatalog::standard();
        let input = IdeaInput { idea: "a recipe box" };
        for backend in [
            ScriptedBackend::new(),
            ScriptedBackend::new().with_error(StageKind::Plan, down()),
            ScriptedBackend::new().with_value(StageKind::Plan, Value::Null),
            ScriptedBackend::new().with_value(
                StageKind::Plan,
                json!({ "milestone1": "", "milestone2": "b", "milestone3": "c" }),
            ),
        ] {
            let report = catalog.plan.run(&backend, &input).await;
            for milestone in report.output.milestones() {
                assert!(!milestone.trim().is_empty());
            }
        }
    }

    #[tokio::test]
    async fn test_flowchart_valid_svg_returned_unchanged() {
        let backend = ScriptedBackend::new().with_value(StageKind::Flowchart, json!("<svg></svg>"));
        let report = StageCatalog::standard()
            .flowchart
            .run(&backend, &IdeaInput { idea: "x" })
            .await;
        assert_eq!(report.output.as_str(), "<svg></svg>");
        assert!(report.is_usable());
    }

    #[tokio::test]
    async fn test_flowchart_null_yields_invalid_fallback() {
        let backend = ScriptedBackend::new().with_value(StageKind::Flowchart, Value::Null);
        let report = StageCatalog::standard()
            .flowchart
            .run(&backend, &IdeaInput { idea: "x" })
            .await;
        assert_eq!(report.output.as_str(), FLOWCHART_INVALID_SVG);
        assert_eq!(report.failure(), Some(FailureKind::ShapeValidation));
    }

    #[tokio::test]
    async fn test_flowchart_error_yields_error_fallback() {
        let backend = ScriptedBackend::new().with_error(StageKind::Flowchart, down());
        let report = StageCatalog::standard()
            .flowchart
            .run(&backend, &IdeaInput { idea: "x" })
            .await;
        assert_eq!(report.output.as_str(), FLOWCHART_ERROR_SVG);
    }

    #[tokio::test]
    async fn test_code_error_returns_error_file() {
        let backend = ScriptedBackend::new().with_error(StageKind::Code, down());
        let input = CodeInput {
            idea: "x",
            plan: "{}",
            flowchart: "<svg/>",
        };
        let report = StageCatalog::standard()
            .code_from_flowchart
            .run(&backend, &input)
            .await;
        assert!(!report.output.files.is_empty());
        let content = &report.output.files[0].file_content;
        assert!(content.contains("error occurred"));
        assert!(content.contains("connection refused"));
        assert!(report
            .output
            .global_styles
            .as_deref()
            .unwrap()
            .contains("connection refused"));
    }

    #[tokio::test]
    async fn test_code_zero_files_is_empty_result() {
        let backend = ScriptedBackend::new()
            .with_value(StageKind::Code, json!({ "files": [], "globalStyles": "" }));
        let input = AdvisedCodeInput {
            idea: "x",
            plan: "{}",
            advice: "{}",
        };
        let report = StageCatalog::standard()
            .code_from_advice
            .run(&backend, &input)
            .await;
        assert_eq!(report.failure(), Some(FailureKind::EmptyResult));
        assert_eq!(report.output.files[0].file_name, "src/app/error.tsx");
        assert!(report.output.files[0]
            .file_content
            .contains("AI did not generate any files."));
    }

    #[tokio::test]
    async fn test_code_null_reply_and_empty_files_read_differently() {
        let input = CodeInput {
            idea: "x",
            plan: "{}",
            flowchart: "<svg/>",
        };
        let stage = StageCatalog::standard().code_from_flowchart;

        let null = ScriptedBackend::new().with_value(StageKind::Code, Value::Null);
        let report = stage.run(&null, &input).await;
        assert_eq!(report.failure(), Some(FailureKind::ShapeValidation));
        assert!(report.output.files[0]
            .file_content
            .contains("Code generation failed to produce output."));

        let empty = ScriptedBackend::new().with_value(StageKind::Code, json!({ "files": null }));
        let report = stage.run(&empty, &input).await;
        assert_eq!(report.failure(), Some(FailureKind::EmptyResult));
        assert!(report.output.files[0]
            .file_content
            .contains("AI did not generate any files."));
        assert_eq!(
            report.output.global_styles.as_deref(),
            Some("/* Error generating styles */")
        );
    }

    #[tokio::test]
    async fn test_image_without_media_uses_failed_placeholder() {
        let backend = ScriptedBackend::new().with_value(StageKind::Image, Value::Null);
        let report = StageCatalog::standard()
            .image
            .run(&backend, &ImageInput { idea: "x", code: "" })
            .await;
        assert_eq!(report.output.as_str(), IMAGE_INVALID_PLACEHOLDER);
        assert_eq!(report.failure(), Some(FailureKind::EmptyResult));
    }

    #[tokio::test]
    async fn test_image_error_uses_error_placeholder() {
        let backend = ScriptedBackend::new().with_error(StageKind::Image, down());
        let report = StageCatalog::standard()
            .image
            .run(&backend, &ImageInput { idea: "x", code: "" })
            .await;
        assert_eq!(report.output.as_str(), IMAGE_ERROR_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_image_prompt_truncates_code_at_1000() {
        let backend = ScriptedBackend::new();
        let code = "y".repeat(1500);
        StageCatalog::standard()
            .image
            .run(&backend, &ImageInput { idea: "x", code: &code })
            .await;
        let prompt = &backend.calls_for(StageKind::Image)[0].prompt;
        assert!(prompt.contains(&format!("{}\n...", "y".repeat(1000))));
        assert!(!prompt.contains(&"y".repeat(1001)));
    }

    #[tokio::test]
    async fn test_insights_null_uses_defaults() {
        let backend = ScriptedBackend::new().with_value(StageKind::Insights, Value::Null);
        let input = InsightsInput {
            idea: "x",
            plan: "{}",
            code: "",
        };
        let report = StageCatalog::standard().insights.run(&backend, &input).await;
        assert_eq!(report.output.estimated_complexity, "Unavailable");
        assert_eq!(report.output.suggested_keywords, vec!["general", "web app"]);
    }

    #[tokio::test]
    async fn test_review_uses_all_four_fields() {
        let backend = ScriptedBackend::new();
        let input = ReviewInput {
            idea: "chess club app",
            plan: r#"{"milestone1":"m1"}"#,
            code: "export default 1;",
            insights: r#"{"estimatedComplexity":"Simple"}"#,
        };
        let report = StageCatalog::standard().review.run(&backend, &input).await;
        assert!(report.is_usable());
        let prompt = &backend.calls_for(StageKind::Review)[0].prompt;
        assert!(prompt.contains("chess club app"));
        assert!(prompt.contains("estimatedComplexity"));
        assert!(prompt.contains("export default 1;"));
    }

    #[tokio::test]
    async fn test_theme_error_uses_safe_palette() {
        let backend = ScriptedBackend::new().with_error(StageKind::Theme, down());
        let report = StageCatalog::standard()
            .theme
            .run(&backend, &IdeaInput { idea: "x" })
            .await;
        assert_eq!(report.output.light_theme, ThemePalette::safe_default());
    }
}
