use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{InputKind, RecognitionRequest, Recognized};

/// The external recognition capability.
///
/// Implementations decode the input format themselves; the orchestration
/// core only ever sees paths, page indices and the results.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Human-readable backend name, used in logs.
    fn name(&self) -> &str;

    /// Number of recognizable units in a paged input.
    async fn probe_unit_count(&self, path: &Path, kind: InputKind) -> Result<usize>;

    /// Recognize one unit.
    async fn recognize(&self, request: &RecognitionRequest) -> Result<Recognized>;
}
