use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for a textra run.
///
/// Everything except `Recognition` and `Io` is raised while validating the
/// command line, before any recognition work starts.
#[derive(Debug, Error)]
pub enum TextraError {
    #[error("file {} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("{} is a directory, expected a file", .0.display())]
    IsDirectory(PathBuf),

    #[error("{}: {reason}", .path.display())]
    UnsupportedType { path: PathBuf, reason: String },

    #[error("{0}")]
    Grammar(String),

    #[error("output destination {} must be a directory: {reason}", .path.display())]
    MustBeDirectory { path: PathBuf, reason: String },

    #[error("output destination {} must contain a pattern ({{}}) to write {units} pages", .path.display())]
    MustContainPattern { path: PathBuf, units: usize },

    #[error("invalid pattern {template}: expected exactly one {{}} placeholder, found {found}")]
    InvalidPattern { template: String, found: usize },

    #[error("output path {} would be written by both {first} and {second}", .path.display())]
    OutputCollision {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("recognition failed for {} (page {page}): {message}", .input.display())]
    Recognition {
        input: PathBuf,
        page: usize,
        message: String,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TextraError {
    pub fn grammar(message: impl Into<String>) -> Self {
        Self::Grammar(message.into())
    }

    /// Unsupported-type error with the standard wording for an unknown extension.
    pub fn unsupported_extension(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_else(|| "without extension".to_string());
        Self::UnsupportedType {
            path,
            reason: format!("file type {ext} is unsupported"),
        }
    }
}

pub type Result<T, E = TextraError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_message_names_the_extension() {
        let err = TextraError::unsupported_extension("notes.docx");
        assert_eq!(err.to_string(), "notes.docx: file type .docx is unsupported");
    }

    #[test]
    fn pattern_message_shows_placeholder() {
        let err = TextraError::MustContainPattern {
            path: "output.txt".into(),
            units: 3,
        };
        assert!(err.to_string().contains("must contain a pattern ({})"));
    }
}
