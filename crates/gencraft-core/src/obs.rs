//! Structured lifecycle events for pipeline runs.
//!
//! - `run_span` tags everything logged during a run with its `run_id`
//! - `emit_*` functions log the run and stage lifecycle at fixed event names
//!
//! Stage-internal detail (prompt digests, fallback reasons) is logged by
//! [`crate::stage`] itself.

use tracing::{info, warn};

use crate::domain::StageKind;

/// Run-scoped span; attach it to the run future with `Instrument`.
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("gencraft.run", run_id = %run_id)
}

/// Emit event: run started.
pub fn emit_run_started(run_id: &str, variant: &str, step_count: usize) {
    info!(
        event = "run.started",
        run_id = %run_id,
        variant = %variant,
        steps = step_count,
    );
}

/// Emit event: a stage settled, either generated or on a fallback.
pub fn emit_stage_finished(run_id: &str, stage: StageKind, usable: bool, duration_ms: u64) {
    info!(
        event = "stage.finished",
        run_id = %run_id,
        stage = %stage,
        usable = usable,
        duration_ms = duration_ms,
    );
}

/// Emit event: a required stage failed and the remaining stages were skipped.
pub fn emit_run_halted(run_id: &str, stage: StageKind, skipped: usize) {
    warn!(
        event = "run.halted",
        run_id = %run_id,
        stage = %stage,
        skipped = skipped,
    );
}

/// Emit event: run finished.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, completed: bool, fallbacks: usize) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        completed = completed,
        fallbacks = fallbacks,
    );
}

/// Emit event: a submission was refused because a run is in progress.
pub fn emit_submit_rejected(reason: &str) {
    warn!(event = "run.rejected", reason = %reason);
}
