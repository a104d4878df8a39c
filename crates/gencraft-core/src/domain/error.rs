//! Domain-level error taxonomy for GenCraft.

/// Errors produced when checking a generated file path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilePathError {
    #[error("file name must not be empty")]
    Empty,

    #[error("file name {path} is absolute")]
    Absolute { path: String },

    #[error("file name {path} escapes the output directory")]
    ParentTraversal { path: String },
}

/// GenCraft domain errors.
#[derive(Debug, thiserror::Error)]
pub enum GencraftError {
    #[error("project idea must not be blank")]
    EmptyIdea,

    #[error("invalid generated file path: {0}")]
    InvalidFilePath(#[from] FilePathError),
}

/// Result type for GenCraft domain operations.
pub type Result<T> = std::result::Result<T, GencraftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gencraft_error_display() {
        let err = GencraftError::EmptyIdea;
        assert!(err.to_string().contains("must not be blank"));

        let err = GencraftError::from(FilePathError::Absolute {
            path: "/etc/passwd".to_string(),
        });
        assert!(err.to_string().contains("invalid generated file path"));
        assert!(err.to_string().contains("/etc/passwd"));
    }

    #[test]
    fn test_parent_traversal_error() {
        let err = FilePathError::ParentTraversal {
            path: "../outside.tsx".to_string(),
        };
        assert!(err.to_string().contains("../outside.tsx"));
        assert!(err.to_string().contains("escapes"));
    }
}
