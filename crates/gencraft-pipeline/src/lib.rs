//! GenCraft Pipeline - staged generation for a project idea
//!
//! Provides the orchestrator that:
//! - Runs plan, flowchart or advice, code, image and insights stages in order
//! - Halts on a failed required stage and skips the rest
//! - Publishes per-stage status and notifications while a run is in flight
//! - Exports a finished run's artifacts to disk

pub mod error;
pub mod export;
pub mod pipeline;
pub mod spec;
pub mod state;
pub mod variant;

// Re-export key types
pub use error::SubmitError;
pub use export::export_outcome;
pub use pipeline::{GenerationPipeline, PipelineOutcome};
pub use spec::RunSpec;
pub use state::{Notification, NotificationLevel, PipelineState, StageStatus, StatusLabel};
pub use variant::{PipelineOptions, PipelineVariant, Requirement, StepConfig};
