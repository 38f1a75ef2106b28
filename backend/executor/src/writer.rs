//! Commits recognition results to their planned destinations.
//!
//! Nothing is written until every result is available, so a failed run never
//! leaves partial output behind.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use textra_core::{RecognitionResult, Result, TextraError};
use textra_planner::{ExecutionPlan, TextRoute};

/// Everything a run will emit, fully rendered in memory.
#[derive(Debug, Default, PartialEq)]
pub struct Rendered {
    /// Files in order of first use, each with its complete contents.
    pub files: Vec<(PathBuf, String)>,
    pub stdout: String,
}

impl Rendered {
    fn append(&mut self, index: &mut HashMap<PathBuf, usize>, path: &Path, text: &str) {
        let slot = *index.entry(path.to_path_buf()).or_insert_with(|| {
            self.files.push((path.to_path_buf(), String::new()));
            self.files.len() - 1
        });
        push_text(&mut self.files[slot].1, text);
    }
}

/// Append one unit's text, keeping units on separate lines.
fn push_text(buffer: &mut String, text: &str) {
    buffer.push_str(text);
    if !text.ends_with('\n') {
        buffer.push('\n');
    }
}

/// Lay out every output of the plan. `results` must be in ordinal order.
pub fn render(plan: &ExecutionPlan, results: &[RecognitionResult]) -> Result<Rendered> {
    let mut rendered = Rendered::default();
    let mut index = HashMap::new();

    for (planned, result) in plan.units().iter().zip(results) {
        debug_assert_eq!(planned.unit, result.unit);

        match &planned.text {
            TextRoute::File(path) => rendered.append(&mut index, path, &result.text),
            TextRoute::Stdout => push_text(&mut rendered.stdout, &result.text),
        }

        if let Some(path) = &planned.page_text {
            rendered.append(&mut index, path, &result.text);
        }

        if let Some(path) = &planned.positions {
            let json = serde_json::to_string_pretty(&result.positions).map_err(|e| {
                TextraError::Io {
                    path: path.clone(),
                    source: std::io::Error::other(e),
                }
            })?;
            rendered.files.push((path.clone(), json));
        }
    }

    Ok(rendered)
}

/// Writes rendered outputs to disk and streams text to `stdout`.
pub struct OutputWriter<W> {
    stdout: W,
}

impl<W: Write> OutputWriter<W> {
    pub fn new(stdout: W) -> Self {
        Self { stdout }
    }

    /// Write every planned output and return the files written, in order.
    pub async fn write(
        &mut self,
        plan: &ExecutionPlan,
        results: &[RecognitionResult],
    ) -> Result<Vec<PathBuf>> {
        let rendered = render(plan, results)?;

        let mut written = Vec::with_capacity(rendered.files.len());
        for (path, contents) in rendered.files {
            debug!(path = %path.display(), bytes = contents.len(), "Writing output");
            tokio::fs::write(&path, contents)
                .await
                .map_err(|source| TextraError::Io {
                    path: path.clone(),
                    source,
                })?;
            written.push(path);
        }

        if !rendered.stdout.is_empty() {
            self.stdout
                .write_all(rendered.stdout.as_bytes())
                .and_then(|_| self.stdout.flush())
                .map_err(|source| TextraError::Io {
                    path: PathBuf::from("<stdout>"),
                    source,
                })?;
        }

        info!(files = written.len(), "Outputs committed");
        Ok(written)
    }

    pub fn into_inner(self) -> W {
        self.stdout
    }
}
