//! Pipeline variants and their step lists.

use gencraft_core::StageKind;
use serde::{Deserialize, Serialize};

/// Stage ordering used for a run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineVariant {
    /// Plan → Flowchart → Code → Image → Insights
    #[default]
    FlowchartFirst,

    /// Plan → Advice → Code → Image → Insights
    AdviceFirst,
}

impl PipelineVariant {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineVariant::FlowchartFirst => "flowchart-first",
            PipelineVariant::AdviceFirst => "advice-first",
        }
    }
}

impl std::fmt::Display for PipelineVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for PipelineVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flowchart-first" | "a" | "A" => Ok(PipelineVariant::FlowchartFirst),
            "advice-first" | "b" | "B" => Ok(PipelineVariant::AdviceFirst),
            other => Err(format!(
                "unknown pipeline variant '{other}' (expected flowchart-first or advice-first)"
            )),
        }
    }
}

/// Whether a stage's failure halts the run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// An unusable output skips every remaining stage.
    Required,
    /// An unusable output is reported and the run continues.
    BestEffort,
}

/// One step of a pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepConfig {
    pub stage: StageKind,
    pub requirement: Requirement,
    pub enabled: bool,
}

impl StepConfig {
    pub fn required(stage: StageKind) -> Self {
        Self {
            stage,
            requirement: Requirement::Required,
            enabled: true,
        }
    }

    pub fn best_effort(stage: StageKind) -> Self {
        Self {
            stage,
            requirement: Requirement::BestEffort,
            enabled: true,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_required(&self) -> bool {
        self.requirement == Requirement::Required
    }
}

/// Run configuration chosen by the caller.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineOptions {
    pub variant: PipelineVariant,
    /// Run a second advice pass over idea, plan, code and insights.
    pub closing_review: bool,
    /// Generate a light theme palette as the last stage.
    pub theme: bool,
}

impl PipelineOptions {
    pub fn new(variant: PipelineVariant) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    pub fn with_closing_review(mut self, enabled: bool) -> Self {
        self.closing_review = enabled;
        self
    }

    pub fn with_theme(mut self, enabled: bool) -> Self {
        self.theme = enabled;
        self
    }

    /// Every step of the variant in execution order, disabled ones included.
    pub fn steps(&self) -> Vec<StepConfig> {
        let mut steps = match self.variant {
            PipelineVariant::FlowchartFirst => vec![
                StepConfig::required(StageKind::Plan),
                StepConfig::required(StageKind::Flowchart),
                StepConfig::required(StageKind::Code),
            ],
            PipelineVariant::AdviceFirst => vec![
                StepConfig::required(StageKind::Plan),
                StepConfig::required(StageKind::Advice),
                StepConfig::best_effort(StageKind::Code),
            ],
        };
        steps.extend([
            StepConfig::best_effort(StageKind::Image),
            StepConfig::best_effort(StageKind::Insights),
            StepConfig::best_effort(StageKind::Review).enabled(self.closing_review),
            StepConfig::best_effort(StageKind::Theme).enabled(self.theme),
        ]);
        steps
    }

    /// Enabled steps only.
    pub fn enabled_steps(&self) -> Vec<StepConfig> {
        self.steps().into_iter().filter(|s| s.enabled).collect()
    }

    pub fn step(&self, stage: StageKind) -> Option<StepConfig> {
        self.enabled_steps().into_iter().find(|s| s.stage == stage)
    }
}
