//! Typed outputs of the generation stages.
//!
//! Every artifact is a value object scoped to one pipeline run. Field names
//! on the wire are camelCase because that is the shape the model is asked to
//! produce; see each type's [`StageArtifact::shape`].

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::error::{FilePathError, GencraftError};
use crate::schema::{Field, Shape};
use crate::stage::{Inspection, StageArtifact};

/// Separator placed between files when a file set is flattened for prompts.
pub const FILE_SEPARATOR: &str = "\n\n// --- End File ---\n\n";

pub const MILESTONE_PLACEHOLDER: &str = "Milestone details were not provided.";

pub const DEFAULT_COMPLEXITY: &str = "Unavailable";
pub const DEFAULT_KEYWORDS: [&str; 2] = ["general", "web app"];
pub const DEFAULT_TIP: &str = "Always test your code thoroughly!";

pub const DEFAULT_KEY_CONSIDERATION: &str =
    "Strategic advice generation returned no specific consideration.";
pub const DEFAULT_NEXT_STEP: &str = "Review project goals and refine requirements.";
pub const DEFAULT_CHALLENGE: &str = "Ensuring market fit and user adoption.";
pub const DEFAULT_LONG_TERM: &str = "Consider potential for feature expansion and scalability.";

/// Serialize an artifact for interpolation into a downstream prompt.
pub(crate) fn to_json_text<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// Treat an explicit `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Replace blank fields with defaults, returning the names that were filled.
fn fill_blank<'a>(fields: impl IntoIterator<Item = (&'static str, &'a mut String, &'a str)>) -> Vec<&'static str> {
    let mut filled = Vec::new();
    for (name, value, default) in fields {
        if value.trim().is_empty() {
            *value = default.to_string();
            filled.push(name);
        }
    }
    filled
}

// ---------------------------------------------------------------------------
// ProjectPlan
// ---------------------------------------------------------------------------

/// Three-milestone plan produced by the plan stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPlan {
    pub milestone1: String,
    pub milestone2: String,
    pub milestone3: String,
}

impl ProjectPlan {
    pub fn milestones(&self) -> [&str; 3] {
        [&self.milestone1, &self.milestone2, &self.milestone3]
    }

    /// JSON text handed to downstream prompts.
    pub fn to_prompt_text(&self) -> String {
        to_json_text(self)
    }
}

impl StageArtifact for ProjectPlan {
    fn shape() -> Shape {
        Shape::object([
            Field::required("milestone1", Shape::String),
            Field::required("milestone2", Shape::String),
            Field::required("milestone3", Shape::String),
        ])
    }

    fn inspect(&mut self) -> Inspection {
        Inspection::from_defaulted(fill_blank([
            ("milestone1", &mut self.milestone1, MILESTONE_PLACEHOLDER),
            ("milestone2", &mut self.milestone2, MILESTONE_PLACEHOLDER),
            ("milestone3", &mut self.milestone3, MILESTONE_PLACEHOLDER),
        ]))
    }
}

// ---------------------------------------------------------------------------
// FlowchartSvg
// ---------------------------------------------------------------------------

/// Flowchart rendered as a standalone SVG document. Never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowchartSvg(String);

impl FlowchartSvg {
    pub fn new(svg: impl Into<String>) -> Self {
        Self(svg.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Non-empty and starting with `<svg`, ignoring case and surrounding whitespace.
    pub fn looks_like_svg(&self) -> bool {
        self.0
            .trim()
            .get(..4)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("<svg"))
    }
}

impl StageArtifact for FlowchartSvg {
    fn shape() -> Shape {
        Shape::String
    }

    fn inspect(&mut self) -> Inspection {
        if self.0.trim().is_empty() {
            Inspection::Unusable("flowchart output was blank")
        } else if !self.looks_like_svg() {
            Inspection::Unusable("flowchart output does not start with <svg")
        } else {
            Inspection::Complete
        }
    }
}

// ---------------------------------------------------------------------------
// GeneratedFileSet
// ---------------------------------------------------------------------------

/// One generated source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFile {
    pub file_name: String,
    pub file_content: String,
}

impl GeneratedFile {
    pub fn new(file_name: impl Into<String>, file_content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            file_content: file_content.into(),
        }
    }

    /// Normalised relative path for this file.
    ///
    /// Rejects absolute paths and any `..` component so that writing the
    /// file under an output directory can never land outside of it.
    pub fn relative_path(&self) -> Result<PathBuf, FilePathError> {
        let trimmed = self.file_name.trim();
        if trimmed.is_empty() {
            return Err(FilePathError::Empty);
        }

        let mut out = PathBuf::new();
        for component in Path::new(trimmed).components() {
            match component {
                Component::Normal(part) => out.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    return Err(FilePathError::ParentTraversal {
                        path: trimmed.to_string(),
                    })
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(FilePathError::Absolute {
                        path: trimmed.to_string(),
                    })
                }
            }
        }

        if out.as_os_str().is_empty() {
            return Err(FilePathError::Empty);
        }
        Ok(out)
    }
}

/// Ordered set of generated files plus optional global styles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFileSet {
    #[serde(default, deserialize_with = "null_as_default")]
    pub files: Vec<GeneratedFile>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_styles: Option<String>,
}

impl GeneratedFileSet {
    /// Single `src/app/error.tsx` page carrying `message`.
    pub fn error_page(message: &str, style_note: &str) -> Self {
        Self {
            files: vec![GeneratedFile::new(
                "src/app/error.tsx",
                format!("export default function ErrorPage() {{ return <p>{message}</p>; }}"),
            )],
            global_styles: Some(format!("/* {style_note} */")),
        }
    }

    /// Relative path of every file, in order. Fails on the first name that
    /// is blank, absolute or climbs out with `..`.
    pub fn relative_paths(&self) -> Result<Vec<PathBuf>, GencraftError> {
        self.files
            .iter()
            .map(|file| file.relative_path().map_err(GencraftError::from))
            .collect()
    }

    /// All files flattened into one annotated text block for downstream prompts.
    pub fn representative_code(&self) -> String {
        self.files
            .iter()
            .map(|file| format!("// --- File: {} ---\n{}", file.file_name, file.file_content))
            .collect::<Vec<_>>()
            .join(FILE_SEPARATOR)
    }
}

impl StageArtifact for GeneratedFileSet {
    fn shape() -> Shape {
        Shape::object([
            Field::optional(
                "files",
                Shape::array(Shape::object([
                    Field::required("fileName", Shape::String),
                    Field::required("fileContent", Shape::String),
                ])),
            ),
            Field::optional("globalStyles", Shape::String),
        ])
    }

    fn inspect(&mut self) -> Inspection {
        if self.files.is_empty() {
            return Inspection::Unusable("no files were generated");
        }

        let mut defaulted = Vec::new();
        for (index, file) in self.files.iter_mut().enumerate() {
            // Blank, absolute and `..` names are all replaced.
            if file.relative_path().is_err() {
                file.file_name = format!("src/components/generated-{}.tsx", index + 1);
                if defaulted.is_empty() {
                    defaulted.push("files.fileName");
                }
            }
        }
        Inspection::from_defaulted(defaulted)
    }
}

// ---------------------------------------------------------------------------
// ConceptualImage
// ---------------------------------------------------------------------------

/// A data URI returned by the image model, or a placeholder URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptualImage(String);

impl ConceptualImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl StageArtifact for ConceptualImage {
    fn shape() -> Shape {
        Shape::String
    }

    fn inspect(&mut self) -> Inspection {
        if self.0.trim().is_empty() {
            Inspection::Unusable("image response carried no media URL")
        } else {
            Inspection::Complete
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectInsights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInsights {
    pub estimated_complexity: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggested_keywords: Vec<String>,
    pub fun_fact_or_tip: String,
}

impl ProjectInsights {
    pub fn to_prompt_text(&self) -> String {
        to_json_text(self)
    }
}

impl StageArtifact for ProjectInsights {
    fn shape() -> Shape {
        Shape::object([
            Field::required("estimatedComplexity", Shape::String),
            Field::optional("suggestedKeywords", Shape::array(Shape::String)),
            Field::required("funFactOrTip", Shape::String),
        ])
    }

    fn inspect(&mut self) -> Inspection {
        let mut defaulted = fill_blank([
            ("estimatedComplexity", &mut self.estimated_complexity, DEFAULT_COMPLEXITY),
            ("funFactOrTip", &mut self.fun_fact_or_tip, DEFAULT_TIP),
        ]);

        self.suggested_keywords.retain(|k| !k.trim().is_empty());
        if self.suggested_keywords.is_empty() {
            self.suggested_keywords = DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect();
            defaulted.push("suggestedKeywords");
        }
        Inspection::from_defaulted(defaulted)
    }
}

// ---------------------------------------------------------------------------
// StrategicAdvice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategicAdvice {
    pub key_consideration: String,
    pub next_step_suggestion: String,
    pub potential_challenge: String,
    pub long_term_thought: String,
}

impl StrategicAdvice {
    /// Generic advice used when the model answers without content.
    pub fn generic() -> Self {
        Self {
            key_consideration: DEFAULT_KEY_CONSIDERATION.to_string(),
            next_step_suggestion: DEFAULT_NEXT_STEP.to_string(),
            potential_challenge: DEFAULT_CHALLENGE.to_string(),
            long_term_thought: DEFAULT_LONG_TERM.to_string(),
        }
    }

    pub fn to_prompt_text(&self) -> String {
        to_json_text(self)
    }
}

impl StageArtifact for StrategicAdvice {
    fn shape() -> Shape {
        Shape::object([
            Field::required("keyConsideration", Shape::String),
            Field::required("nextStepSuggestion", Shape::String),
            Field::required("potentialChallenge", Shape::String),
            Field::required("longTermThought", Shape::String),
        ])
    }

    fn inspect(&mut self) -> Inspection {
        Inspection::from_defaulted(fill_blank([
            ("keyConsideration", &mut self.key_consideration, DEFAULT_KEY_CONSIDERATION),
            ("nextStepSuggestion", &mut self.next_step_suggestion, DEFAULT_NEXT_STEP),
            ("potentialChallenge", &mut self.potential_challenge, DEFAULT_CHALLENGE),
            ("longTermThought", &mut self.long_term_thought, DEFAULT_LONG_TERM),
        ]))
    }
}

// ---------------------------------------------------------------------------
// ThemeColors
// ---------------------------------------------------------------------------

/// HSL component strings such as `"220 90% 50%"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemePalette {
    pub background: String,
    pub foreground: String,
    pub primary: String,
    pub accent: String,
}

impl ThemePalette {
    /// White, near black, strong blue, strong orange.
    pub fn safe_default() -> Self {
        Self {
            background: "0 0% 100%".to_string(),
            foreground: "0 0% 13%".to_string(),
            primary: "220 90% 50%".to_string(),
            accent: "30 90% 50%".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeColors {
    pub light_theme: ThemePalette,
}

impl StageArtifact for ThemeColors {
    fn shape() -> Shape {
        Shape::object([Field::required(
            "lightTheme",
            Shape::object([
                Field::required("background", Shape::String),
                Field::required("foreground", Shape::String),
                Field::required("primary", Shape::String),
                Field::required("accent", Shape::String),
            ]),
        )])
    }

    fn inspect(&mut self) -> Inspection {
        let defaults = ThemePalette::safe_default();
        let palette = &mut self.light_theme;
        Inspection::from_defaulted(fill_blank([
            ("lightTheme.background", &mut palette.background, defaults.background.as_str()),
            ("lightTheme.foreground", &mut palette.foreground, defaults.foreground.as_str()),
            ("lightTheme.primary", &mut palette.primary, defaults.primary.as_str()),
            ("lightTheme.accent", &mut palette.accent, defaults.accent.as_str()),
        ]))
    }
}
