//! Pipeline orchestration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use gencraft_core::obs::{
    emit_run_finished, emit_run_halted, emit_run_started, emit_stage_finished,
    emit_submit_rejected, run_span,
};
use gencraft_core::{
    AdviceInput, AdvisedCodeInput, CodeInput, FailureKind, GeneratedFileSet, GenerationBackend,
    GenerationStage, IdeaInput, ImageInput, InsightsInput, ProjectIdea, ProjectInsights,
    ProjectPlan, ReviewInput, StageArtifact, StageCatalog, StageInput, StageKind, StageOutcome,
    StageReport, StrategicAdvice,
};
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{info, Instrument};

use crate::error::SubmitError;
use crate::spec::RunSpec;
use crate::state::{failure_text, Notification, NotificationLevel, PipelineState, StageStatus};
use crate::variant::{PipelineOptions, PipelineVariant};

const NOTIFICATION_CAPACITY: usize = 64;

/// Result of a complete pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub spec: RunSpec,

    /// Final state of every stage slot.
    pub state: PipelineState,

    /// Notifications in emission order, one per settled stage.
    pub notifications: Vec<Notification>,

    /// Required stage whose failure skipped the rest of the run.
    pub halted_at: Option<StageKind>,

    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

impl PipelineOutcome {
    /// Whether every enabled stage got a chance to run.
    pub fn completed(&self) -> bool {
        self.halted_at.is_none()
    }

    pub fn fallback_count(&self) -> usize {
        self.state.fallback_count()
    }
}

/// Clears the in-flight flag when the run ends, however it ends.
struct ActiveGuard<'a>(&'a AtomicBool);

impl<'a> ActiveGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ActiveGuard(flag))
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs the configured stages in order for one idea at a time.
///
/// Progress is observable while a run is in flight:
/// - [`subscribe_state`](Self::subscribe_state) yields the per-stage status
/// - [`subscribe`](Self::subscribe) yields notifications as stages settle
pub struct GenerationPipeline {
    backend: Arc<dyn GenerationBackend>,
    catalog: StageCatalog,
    options: PipelineOptions,
    state: watch::Sender<PipelineState>,
    notifications: broadcast::Sender<Notification>,
    active: AtomicBool,
}

impl GenerationPipeline {
    pub fn new(backend: Arc<dyn GenerationBackend>, options: PipelineOptions) -> Self {
        let (state, _) = watch::channel(PipelineState::default());
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            backend,
            catalog: StageCatalog::standard(),
            options,
            state,
            notifications,
            active: AtomicBool::new(false),
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> PipelineState {
        self.state.borrow().clone()
    }

    /// Whether a run is in flight.
    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Run every enabled stage for `idea`.
    ///
    /// Rejected without touching the current state when a run is already in
    /// flight. Stage failures never surface here; they end up in the outcome
    /// as fallback outputs and failure notifications.
    pub async fn submit(&self, idea: &str) -> Result<PipelineOutcome, SubmitError> {
        let Some(_guard) = ActiveGuard::acquire(&self.active) else {
            emit_submit_rejected("run already in progress");
            return Err(SubmitError::AlreadyRunning);
        };

        let Ok(idea) = ProjectIdea::new(idea) else {
            emit_submit_rejected("empty idea");
            self.broadcast(Notification::input_required());
            return Err(SubmitError::EmptyIdea);
        };

        let spec = RunSpec::new(&idea, &self.options);
        let span = run_span(&spec.run_id.to_string());
        Ok(self.run(spec, idea).instrument(span).await)
    }

    async fn run(&self, spec: RunSpec, idea: ProjectIdea) -> PipelineOutcome {
        let start = Instant::now();
        let run_id = spec.run_id.to_string();
        let stages: Vec<StageKind> = self
            .options
            .enabled_steps()
            .iter()
            .map(|step| step.stage)
            .collect();

        self.state
            .send_replace(PipelineState::for_run(spec.run_id, &stages));
        emit_run_started(&run_id, self.options.variant.name(), stages.len());
        info!(run_id = %run_id, variant = %self.options.variant, "Starting generation pipeline");

        let mut run = Run {
            pipeline: self,
            run_id: run_id.clone(),
            spec,
            notifications: Vec::new(),
            halted_at: None,
        };
        run.execute(&idea).await;

        let duration_ms = start.elapsed().as_millis() as u64;
        let state = self.state();
        emit_run_finished(
            &run_id,
            duration_ms,
            run.halted_at.is_none(),
            state.fallback_count(),
        );

        PipelineOutcome {
            spec: run.spec,
            state,
            notifications: run.notifications,
            halted_at: run.halted_at,
            duration_ms,
        }
    }

    fn broadcast(&self, notification: Notification) {
        // No subscribers is fine.
        self.notifications.send(notification).ok();
    }
}

type Slot<O> = fn(&mut PipelineState) -> &mut StageStatus<O>;

/// Bookkeeping for one in-flight run.
struct Run<'p> {
    pipeline: &'p GenerationPipeline,
    run_id: String,
    spec: RunSpec,
    notifications: Vec<Notification>,
    halted_at: Option<StageKind>,
}

impl Run<'_> {
    async fn execute(&mut self, idea: &ProjectIdea) {
        let pipeline = self.pipeline;
        let catalog = &pipeline.catalog;
        let idea = idea.as_str();

        let plan = self
            .step(&catalog.plan, &IdeaInput { idea }, |s| &mut s.plan)
            .await;
        let plan_text = usable_text(&plan, ProjectPlan::to_prompt_text);

        let code = match pipeline.options.variant {
            PipelineVariant::FlowchartFirst => {
                let flowchart = self
                    .step(&catalog.flowchart, &IdeaInput { idea }, |s| &mut s.flowchart)
                    .await;
                let flowchart_text = usable_text(&flowchart, |svg| svg.as_str().to_string());

                let input = CodeInput {
                    idea,
                    plan: &plan_text,
                    flowchart: &flowchart_text,
                };
                self.step(&catalog.code_from_flowchart, &input, |s| &mut s.code)
                    .await
            }
            PipelineVariant::AdviceFirst => {
                let input = AdviceInput {
                    idea,
                    plan: &plan_text,
                };
                let advice = self
                    .step(&catalog.advice, &input, |s| &mut s.advice)
                    .await;
                let advice_text = usable_text(&advice, StrategicAdvice::to_prompt_text);

                let input = AdvisedCodeInput {
                    idea,
                    plan: &plan_text,
                    advice: &advice_text,
                };
                self.step(&catalog.code_from_advice, &input, |s| &mut s.code)
                    .await
            }
        };
        let code_text = usable_text(&code, GeneratedFileSet::representative_code);

        let input = ImageInput {
            idea,
            code: &code_text,
        };
        self.step(&catalog.image, &input, |s| &mut s.image).await;

        let input = InsightsInput {
            idea,
            plan: &plan_text,
            code: &code_text,
        };
        let insights = self
            .step(&catalog.insights, &input, |s| &mut s.insights)
            .await;
        let insights_text = usable_text(&insights, ProjectInsights::to_prompt_text);

        let input = ReviewInput {
            idea,
            plan: &plan_text,
            code: &code_text,
            insights: &insights_text,
        };
        self.step(&catalog.review, &input, |s| &mut s.review).await;

        self.step(&catalog.theme, &IdeaInput { idea }, |s| &mut s.theme)
            .await;
    }

    /// Run one stage if it is enabled and the run has not halted.
    async fn step<O, I>(
        &mut self,
        stage: &GenerationStage<O>,
        input: &I,
        slot: Slot<O>,
    ) -> Option<StageReport<O>>
    where
        O: StageArtifact,
        I: StageInput + Sync + ?Sized,
    {
        let kind = stage.kind();
        let step = self.pipeline.options.step(kind)?;
        if self.halted_at.is_some() {
            return None;
        }

        info!(stage = %kind, "Executing stage");
        self.pipeline
            .state
            .send_modify(|s| *slot(s) = StageStatus::Running);

        let report = stage.run(self.pipeline.backend.as_ref(), input).await;

        self.pipeline
            .state
            .send_modify(|s| *slot(s) = StageStatus::from_report(&report));
        emit_stage_finished(&self.run_id, kind, report.is_usable(), report.duration_ms);

        let halt = step.is_required() && !report.is_usable();
        self.notify(stage_notification(&self.spec, &report, halt));
        if halt {
            self.halt(kind);
        }
        Some(report)
    }

    fn halt(&mut self, kind: StageKind) {
        let mut skipped = 0;
        self.pipeline
            .state
            .send_modify(|s| skipped = s.skip_pending());
        self.halted_at = Some(kind);
        emit_run_halted(&self.run_id, kind, skipped);
    }

    fn notify(&mut self, notification: Notification) {
        self.pipeline.broadcast(notification.clone());
        self.notifications.push(notification);
    }
}

/// Prompt text of a generated output; empty for fallbacks and skipped stages.
fn usable_text<O>(report: &Option<StageReport<O>>, render: impl Fn(&O) -> String) -> String {
    report
        .as_ref()
        .filter(|r| r.is_usable())
        .map(|r| render(&r.output))
        .unwrap_or_default()
}

fn stage_notification<O>(spec: &RunSpec, report: &StageReport<O>, halted: bool) -> Notification {
    let kind = report.stage;
    let run_id = Some(spec.run_id);

    match &report.outcome {
        StageOutcome::Generated => Notification::new(
            run_id,
            Some(kind),
            NotificationLevel::Success,
            format!("{} Generated!", kind.title()),
            "",
        ),
        StageOutcome::Defaulted { fields } => Notification::new(
            run_id,
            Some(kind),
            NotificationLevel::Success,
            format!("{} Generated!", kind.title()),
            format!("Some fields were missing and defaults were used: {}", fields.join(", ")),
        ),
        StageOutcome::Fallback {
            failure: FailureKind::EmptyResult,
            ..
        } if kind == StageKind::Code => {
            let description = if halted {
                "No files were generated, skipping image and insights."
            } else {
                "No files were generated. The remaining stages continue without code."
            };
            Notification::new(
                run_id,
                Some(kind),
                NotificationLevel::Note,
                "Code Generation Note",
                description,
            )
        }
        StageOutcome::Fallback { .. } => {
            let (title, description) = failure_text(kind);
            let description = if halted {
                format!("{description} Remaining stages were skipped.")
            } else {
                description.to_string()
            };
            Notification::new(
                run_id,
                Some(kind),
                NotificationLevel::Failure,
                title,
                description,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gencraft_core::fakes::ScriptedBackend;
    use gencraft_core::GenerationError;
    use serde_json::json;

    fn pipeline(backend: ScriptedBackend, options: PipelineOptions) -> GenerationPipeline {
        GenerationPipeline::new(Arc::new(backend), options)
    }

    #[tokio::test]
    async fn test_all_stages_succeed() {
        let outcome = pipeline(ScriptedBackend::new(), PipelineOptions::default())
            .submit("A recipe sharing app")
            .await
            .unwrap();

        assert!(outcome.completed());
        assert_eq!(outcome.fallback_count(), 0);
        assert_eq!(outcome.notifications.len(), 5);
        assert!(outcome
            .notifications
            .iter()
            .all(|n| n.level == NotificationLevel::Success));
        assert_eq!(outcome.notifications[0].title, "Project Plan Generated!");
        assert_eq!(
            outcome.notifications[2].title,
            "React Code & Styles Generated!"
        );
        assert!(outcome.state.code.usable_output().is_some());
    }

    #[tokio::test]
    async fn test_guard_released_after_run() {
        let pipeline = pipeline(ScriptedBackend::new(), PipelineOptions::default());
        pipeline.submit("first").await.unwrap();
        assert!(!pipeline.is_running());
        pipeline.submit("second").await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_idea_broadcasts_input_required() {
        let pipeline = pipeline(ScriptedBackend::new(), PipelineOptions::default());
        let mut rx = pipeline.subscribe();

        assert_eq!(pipeline.submit("   ").await.unwrap_err(), SubmitError::EmptyIdea);
        assert!(!pipeline.is_running());

        let notification = rx.recv().await.unwrap();
        assert_eq!(notification.title, "Input Required");
        assert_eq!(notification.run_id, None);
    }

    #[tokio::test]
    async fn test_flowchart_failure_halts_flowchart_first() {
        let backend = ScriptedBackend::new().with_error(
            StageKind::Flowchart,
            GenerationError::Transport("connection reset".to_string()),
        );
        let outcome = pipeline(backend, PipelineOptions::default())
            .submit("A chess tutor")
            .await
            .unwrap();

        assert_eq!(outcome.halted_at, Some(StageKind::Flowchart));
        assert_eq!(outcome.notifications.len(), 2);
        assert_eq!(
            outcome.notifications[1].title,
            "Flowchart Generation Failed"
        );
        assert!(outcome.notifications[1]
            .description
            .ends_with("Remaining stages were skipped."));
        assert_eq!(outcome.state.code, StageStatus::Skipped);
        assert_eq!(outcome.state.insights, StageStatus::Skipped);
    }

    #[tokio::test]
    async fn test_defaulted_plan_still_counts_as_success() {
        let backend = ScriptedBackend::new().with_value(
            StageKind::Plan,
            json!({"milestone1": "Set up", "milestone2": "", "milestone3": "Ship"}),
        );
        let outcome = pipeline(backend, PipelineOptions::default())
            .submit("A chess tutor")
            .await
            .unwrap();

        assert!(outcome.completed());
        assert_eq!(outcome.notifications[0].level, NotificationLevel::Success);
        assert!(outcome.notifications[0].description.contains("milestone2"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_run_logs_each_executed_stage() {
        let backend = ScriptedBackend::new().with_error(
            StageKind::Plan,
            GenerationError::Api {
                status: 500,
                message: "internal".to_string(),
            },
        );
        pipeline(backend, PipelineOptions::default())
            .submit("A chess tutor")
            .await
            .unwrap();

        assert!(logs_contain("Starting generation pipeline"));
        assert!(logs_contain("stage=plan"));
        assert!(!logs_contain("stage=flowchart"));
    }

    #[test]
    fn test_usable_text_ignores_missing_reports() {
        let none: Option<StageReport<ProjectPlan>> = None;
        assert_eq!(usable_text(&none, ProjectPlan::to_prompt_text), "");
    }
}
