//! Run identity.

use chrono::{DateTime, Utc};
use gencraft_core::domain::{ordered_names_digest, sha256_hex};
use gencraft_core::ProjectIdea;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::variant::{PipelineOptions, PipelineVariant};

/// Identity of one pipeline run.
///
/// Two runs of the same idea with the same options share `idea_digest`
/// and `steps_digest`; `run_id` is unique per run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSpec {
    pub run_id: Uuid,

    pub variant: PipelineVariant,

    /// SHA-256 of the idea text.
    pub idea_digest: String,

    /// SHA-256 of the ordered enabled stage names (deterministic).
    pub steps_digest: String,

    pub started_at: DateTime<Utc>,
}

impl RunSpec {
    pub fn new(idea: &ProjectIdea, options: &PipelineOptions) -> Self {
        let names: Vec<&str> = options
            .enabled_steps()
            .iter()
            .map(|step| step.stage.name())
            .collect();

        Self {
            run_id: Uuid::new_v4(),
            variant: options.variant,
            idea_digest: sha256_hex(idea.as_str()),
            steps_digest: ordered_names_digest(&names),
            started_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idea(text: &str) -> ProjectIdea {
        ProjectIdea::new(text).unwrap()
    }

    #[test]
    fn test_same_inputs_same_digests() {
        let options = PipelineOptions::default();
        let a = RunSpec::new(&idea("todo app"), &options);
        let b = RunSpec::new(&idea("todo app"), &options);

        assert_ne!(a.run_id, b.run_id);
        assert_eq!(a.idea_digest, b.idea_digest);
        assert_eq!(a.steps_digest, b.steps_digest);
        assert_eq!(a.idea_digest.len(), 64);
    }

    #[test]
    fn test_steps_digest_tracks_options() {
        let base = RunSpec::new(&idea("todo app"), &PipelineOptions::default());
        let themed = RunSpec::new(
            &idea("todo app"),
            &PipelineOptions::default().with_theme(true),
        );
        let advice = RunSpec::new(
            &idea("todo app"),
            &PipelineOptions::new(PipelineVariant::AdviceFirst),
        );

        assert_ne!(base.steps_digest, themed.steps_digest);
        assert_ne!(base.steps_digest, advice.steps_digest);
    }
}
