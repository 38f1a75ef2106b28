//! Input resolution: existence, file-type and page-count checks.

use std::path::Path;

use textra_core::{InputKind, InputSpec, Recognizer, Result, TextraError};
use tracing::debug;

use crate::mime_detect::input_kind;

/// Classify a path without probing it, or report why it cannot be an input.
///
/// Shared by [`resolve`] and by the command-line parser, which uses it to
/// tell a trailing destination apart from one more input.
pub fn classify(path: &Path) -> Result<InputKind> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(TextraError::NotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(TextraError::UnsupportedType {
                path: path.to_path_buf(),
                reason: format!("cannot be read: {e}"),
            });
        }
    };

    if metadata.is_dir() {
        return Err(TextraError::IsDirectory(path.to_path_buf()));
    }
    if !metadata.is_file() {
        return Err(TextraError::UnsupportedType {
            path: path.to_path_buf(),
            reason: "not a regular file".to_string(),
        });
    }

    input_kind(path).ok_or_else(|| TextraError::unsupported_extension(path))
}

/// Resolve one input path into an [`InputSpec`].
pub async fn resolve(path: &Path, recognizer: &dyn Recognizer) -> Result<InputSpec> {
    let kind = classify(path)?;

    let unit_count = match kind {
        InputKind::Image | InputKind::Audio => 1,
        InputKind::Document => {
            let pages = recognizer
                .probe_unit_count(path, kind)
                .await
                .map_err(|e| TextraError::UnsupportedType {
                    path: path.to_path_buf(),
                    reason: format!("document cannot be opened: {e}"),
                })?;
            if pages == 0 {
                return Err(TextraError::UnsupportedType {
                    path: path.to_path_buf(),
                    reason: "document has no pages".to_string(),
                });
            }
            pages
        }
    };

    debug!(path = %path.display(), %kind, unit_count, "Resolved input");

    Ok(InputSpec {
        path: path.to_path_buf(),
        kind,
        unit_count,
    })
}

/// Resolve every input in command-line order, stopping at the first failure.
pub async fn resolve_all<P: AsRef<Path>>(
    paths: &[P],
    recognizer: &dyn Recognizer,
) -> Result<Vec<InputSpec>> {
    let mut inputs = Vec::with_capacity(paths.len());
    for path in paths {
        inputs.push(resolve(path.as_ref(), recognizer).await?);
    }
    Ok(inputs)
}
