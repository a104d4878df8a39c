//! Errors surfaced by `GenerationPipeline::submit`.

use thiserror::Error;

/// Why a submission did not start a run.
///
/// Stage failures never show up here; they become fallback outputs and
/// failure notifications inside the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("project idea is empty")]
    EmptyIdea,

    #[error("a generation run is already in progress")]
    AlreadyRunning,
}
