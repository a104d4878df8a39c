//! Lifecycle events for pipeline runs are emitted without panicking and
//! run spans can be entered and dropped.

use gencraft_core::obs::{
    emit_run_finished, emit_run_halted, emit_run_started, emit_stage_finished,
    emit_submit_rejected, run_span,
};
use gencraft_core::StageKind;
use tracing::Instrument;
use tracing_test::traced_test;

#[traced_test]
#[test]
fn test_emit_run_started() {
    emit_run_started("run-123", "flowchart_first", 5);
}

#[traced_test]
#[test]
fn test_emit_stage_finished() {
    emit_stage_finished("run-123", StageKind::Flowchart, true, 840);
    emit_stage_finished("run-123", StageKind::Image, false, 12);
}

#[traced_test]
#[test]
fn test_emit_run_halted_and_finished() {
    emit_run_halted("run-456", StageKind::Plan, 4);
    emit_run_finished("run-456", 1200, false, 1);
}

#[traced_test]
#[test]
fn test_emit_submit_rejected() {
    emit_submit_rejected("a run is already in progress");
}

#[traced_test]
#[test]
fn test_run_span_enter_and_drop() {
    let span = run_span("test-span-run").entered();
    emit_stage_finished("test-span-run", StageKind::Plan, true, 1);
    drop(span);
}

#[traced_test]
#[tokio::test]
async fn test_run_span_instruments_futures() {
    async {
        emit_stage_finished("run-async", StageKind::Code, true, 3);
    }
    .instrument(run_span("run-async"))
    .await;
}
