//! Stage vocabulary shared by every layer.

use serde::{Deserialize, Serialize};

/// The generation stages a pipeline can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Three-milestone project plan.
    Plan,
    /// Flowchart of the project workflow as an SVG document.
    Flowchart,
    /// React starter files plus optional global styles.
    Code,
    /// Conceptual UI mockup image.
    Image,
    /// Complexity, keywords and a tip.
    Insights,
    /// Strategic advice from the idea and plan.
    Advice,
    /// Closing strategic review over idea, plan, code and insights.
    Review,
    /// Suggested light theme palette.
    Theme,
}

impl StageKind {
    pub const ALL: [StageKind; 8] = [
        StageKind::Plan,
        StageKind::Flowchart,
        StageKind::Code,
        StageKind::Image,
        StageKind::Insights,
        StageKind::Advice,
        StageKind::Review,
        StageKind::Theme,
    ];

    /// Stable machine name.
    pub fn name(&self) -> &'static str {
        match self {
            StageKind::Plan => "plan",
            StageKind::Flowchart => "flowchart",
            StageKind::Code => "code",
            StageKind::Image => "image",
            StageKind::Insights => "insights",
            StageKind::Advice => "advice",
            StageKind::Review => "review",
            StageKind::Theme => "theme",
        }
    }

    /// Human-readable label used in notifications.
    pub fn title(&self) -> &'static str {
        match self {
            StageKind::Plan => "Project Plan",
            StageKind::Flowchart => "Flowchart",
            StageKind::Code => "React Code & Styles",
            StageKind::Image => "Conceptual App Image",
            StageKind::Insights => "Project Insights",
            StageKind::Advice => "Strategic Advice",
            StageKind::Review => "Strategic Review",
            StageKind::Theme => "Theme Colors",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
