//! Observable run state and user-facing notifications.

use chrono::{DateTime, Utc};
use gencraft_core::{
    ConceptualImage, FailureKind, FlowchartSvg, GeneratedFileSet, ProjectInsights, ProjectPlan,
    StageKind, StageOutcome, StageReport, StrategicAdvice, ThemeColors,
};
use serde::Serialize;
use uuid::Uuid;

/// Lifecycle of one stage slot within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageStatus<T> {
    Pending,
    Running,
    Succeeded {
        output: T,
    },
    FailedFallback {
        output: T,
        failure: FailureKind,
        detail: String,
    },
    Skipped,
}

/// Payload-free view of a [`StageStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLabel {
    Pending,
    Running,
    Succeeded,
    FailedFallback,
    Skipped,
}

impl std::fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StatusLabel::Pending => "pending",
            StatusLabel::Running => "running",
            StatusLabel::Succeeded => "succeeded",
            StatusLabel::FailedFallback => "fallback",
            StatusLabel::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

impl<T> Default for StageStatus<T> {
    fn default() -> Self {
        StageStatus::Pending
    }
}

impl<T: Clone> StageStatus<T> {
    pub fn from_report(report: &StageReport<T>) -> Self {
        match &report.outcome {
            StageOutcome::Generated | StageOutcome::Defaulted { .. } => StageStatus::Succeeded {
                output: report.output.clone(),
            },
            StageOutcome::Fallback { failure, detail } => StageStatus::FailedFallback {
                output: report.output.clone(),
                failure: *failure,
                detail: detail.clone(),
            },
        }
    }
}

impl<T> StageStatus<T> {
    pub fn label(&self) -> StatusLabel {
        match self {
            StageStatus::Pending => StatusLabel::Pending,
            StageStatus::Running => StatusLabel::Running,
            StageStatus::Succeeded { .. } => StatusLabel::Succeeded,
            StageStatus::FailedFallback { .. } => StatusLabel::FailedFallback,
            StageStatus::Skipped => StatusLabel::Skipped,
        }
    }

    /// Output, fallback or not.
    pub fn output(&self) -> Option<&T> {
        match self {
            StageStatus::Succeeded { output } | StageStatus::FailedFallback { output, .. } => {
                Some(output)
            }
            _ => None,
        }
    }

    /// Output only when it was generated.
    pub fn usable_output(&self) -> Option<&T> {
        match self {
            StageStatus::Succeeded { output } => Some(output),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, StageStatus::Running)
    }

    fn skip_if_pending(&mut self) -> bool {
        if matches!(self, StageStatus::Pending) {
            *self = StageStatus::Skipped;
            true
        } else {
            false
        }
    }
}

/// Latest known state of every stage slot.
///
/// Reset at the start of each run. Slots the configured variant does not
/// use start out as `Skipped`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineState {
    pub run_id: Option<Uuid>,
    pub plan: StageStatus<ProjectPlan>,
    pub flowchart: StageStatus<FlowchartSvg>,
    pub advice: StageStatus<StrategicAdvice>,
    pub code: StageStatus<GeneratedFileSet>,
    pub image: StageStatus<ConceptualImage>,
    pub insights: StageStatus<ProjectInsights>,
    pub review: StageStatus<StrategicAdvice>,
    pub theme: StageStatus<ThemeColors>,
}

impl PipelineState {
    /// Fresh state for a run over `stages`.
    pub fn for_run(run_id: Uuid, stages: &[StageKind]) -> Self {
        let mut state = PipelineState {
            run_id: Some(run_id),
            ..PipelineState::default()
        };
        for kind in StageKind::ALL {
            if !stages.contains(&kind) {
                state.set_skipped(kind);
            }
        }
        state
    }

    pub fn label(&self, kind: StageKind) -> StatusLabel {
        match kind {
            StageKind::Plan => self.plan.label(),
            StageKind::Flowchart => self.flowchart.label(),
            StageKind::Advice => self.advice.label(),
            StageKind::Code => self.code.label(),
            StageKind::Image => self.image.label(),
            StageKind::Insights => self.insights.label(),
            StageKind::Review => self.review.label(),
            StageKind::Theme => self.theme.label(),
        }
    }

    pub fn set_skipped(&mut self, kind: StageKind) {
        match kind {
            StageKind::Plan => self.plan = StageStatus::Skipped,
            StageKind::Flowchart => self.flowchart = StageStatus::Skipped,
            StageKind::Advice => self.advice = StageStatus::Skipped,
            StageKind::Code => self.code = StageStatus::Skipped,
            StageKind::Image => self.image = StageStatus::Skipped,
            StageKind::Insights => self.insights = StageStatus::Skipped,
            StageKind::Review => self.review = StageStatus::Skipped,
            StageKind::Theme => self.theme = StageStatus::Skipped,
        }
    }

    /// Mark every still-pending slot as skipped; returns how many were.
    pub fn skip_pending(&mut self) -> usize {
        [
            self.plan.skip_if_pending(),
            self.flowchart.skip_if_pending(),
            self.advice.skip_if_pending(),
            self.code.skip_if_pending(),
            self.image.skip_if_pending(),
            self.insights.skip_if_pending(),
            self.review.skip_if_pending(),
            self.theme.skip_if_pending(),
        ]
        .into_iter()
        .filter(|skipped| *skipped)
        .count()
    }

    pub fn is_any_stage_active(&self) -> bool {
        StageKind::ALL
            .into_iter()
            .any(|kind| self.label(kind) == StatusLabel::Running)
    }

    /// Stage labels in canonical stage order.
    pub fn summary(&self) -> Vec<(StageKind, StatusLabel)> {
        StageKind::ALL
            .into_iter()
            .map(|kind| (kind, self.label(kind)))
            .collect()
    }

    pub fn fallback_count(&self) -> usize {
        self.summary()
            .iter()
            .filter(|(_, label)| *label == StatusLabel::FailedFallback)
            .count()
    }
}

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Failure,
    Note,
}

/// Human-readable status event, one per settled stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Absent for submissions rejected before a run started.
    pub run_id: Option<Uuid>,
    pub stage: Option<StageKind>,
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
    pub at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        run_id: Option<Uuid>,
        stage: Option<StageKind>,
        level: NotificationLevel,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            run_id,
            stage,
            level,
            title: title.into(),
            description: description.into(),
            at: Utc::now(),
        }
    }

    pub fn input_required() -> Self {
        Self::new(
            None,
            None,
            NotificationLevel::Failure,
            "Input Required",
            "Please enter your project idea.",
        )
    }
}

/// Failure title and description shown when `kind` falls back.
pub fn failure_text(kind: StageKind) -> (&'static str, &'static str) {
    match kind {
        StageKind::Plan => (
            "Project Plan Generation Failed",
            "Could not generate project plan. Please try again.",
        ),
        StageKind::Flowchart => (
            "Flowchart Generation Failed",
            "Could not generate flowchart. Please try again.",
        ),
        StageKind::Code => (
            "Code Generation Failed",
            "Could not generate React code. Please try again.",
        ),
        StageKind::Image => (
            "Image Generation Failed",
            "Could not generate a conceptual image. Please try again.",
        ),
        StageKind::Insights => (
            "Insights Generation Failed",
            "Could not generate project insights.",
        ),
        StageKind::Advice => (
            "Strategic Advice Generation Failed",
            "Could not generate strategic advice. Please try again.",
        ),
        StageKind::Review => (
            "Strategic Review Generation Failed",
            "Could not generate the closing strategic review.",
        ),
        StageKind::Theme => (
            "Theme Generation Failed",
            "Could not generate theme colors. The default palette is used instead.",
        ),
    }
}
