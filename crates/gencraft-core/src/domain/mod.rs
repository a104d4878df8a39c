//! Domain models for GenCraft.
//!
//! Canonical definitions for the run-scoped values:
//! - `ProjectIdea`: the validated user input
//! - `StageKind`: the stage vocabulary
//! - artifacts: the typed output of each stage

pub mod artifacts;
pub mod digest;
pub mod error;
pub mod idea;
pub mod kind;

// Re-export main types and errors
pub use artifacts::{
    ConceptualImage, FlowchartSvg, GeneratedFile, GeneratedFileSet, ProjectInsights, ProjectPlan,
    StrategicAdvice, ThemeColors, ThemePalette, FILE_SEPARATOR,
};
pub use digest::{ordered_names_digest, sha256_hex};
pub use error::{FilePathError, GencraftError, Result};
pub use idea::ProjectIdea;
pub use kind::StageKind;
