//! The root input of every pipeline run.

use serde::{Deserialize, Serialize};

use crate::domain::error::{GencraftError, Result};

/// Free-text project idea submitted by the user.
///
/// The text is kept verbatim (no trimming) because it is interpolated into
/// prompts as-is; only all-whitespace input is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectIdea(String);

impl ProjectIdea {
    /// Validate and wrap an idea.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(GencraftError::EmptyIdea);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProjectIdea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_idea_rejected() {
        assert!(matches!(ProjectIdea::new(""), Err(GencraftError::EmptyIdea)));
        assert!(matches!(
            ProjectIdea::new("  \n\t "),
            Err(GencraftError::EmptyIdea)
        ));
    }

    #[test]
    fn test_idea_kept_verbatim() {
        let idea = ProjectIdea::new("  a weather dashboard ").unwrap();
        assert_eq!(idea.as_str(), "  a weather dashboard ");
        assert_eq!(idea.to_string(), "  a weather dashboard ");
    }
}
