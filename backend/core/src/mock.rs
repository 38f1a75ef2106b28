//! Deterministic recognizer used by tests across the workspace.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::traits::Recognizer;
use crate::types::{InputKind, Position, RecognitionRequest, Recognized, Region};

/// A recognizer that returns canned text.
///
/// Unless overridden, the text of a unit is `"<file stem> page <n>"` and a
/// single position covering the whole page is reported.
#[derive(Default)]
pub struct MockRecognizer {
    page_counts: HashMap<PathBuf, usize>,
    texts: HashMap<PathBuf, String>,
    delays: HashMap<PathBuf, Duration>,
    failure: Option<(PathBuf, usize)>,
    calls: AtomicUsize,
    locales: Mutex<Vec<Option<String>>>,
}

impl MockRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(mut self, path: impl Into<PathBuf>, pages: usize) -> Self {
        self.page_counts.insert(path.into(), pages);
        self
    }

    pub fn with_text(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.texts.insert(path.into(), text.into());
        self
    }

    /// Delay every recognition of `path`, to shuffle completion order.
    pub fn with_delay(mut self, path: impl Into<PathBuf>, delay: Duration) -> Self {
        self.delays.insert(path.into(), delay);
        self
    }

    pub fn failing_on(mut self, path: impl Into<PathBuf>, page: usize) -> Self {
        self.failure = Some((path.into(), page));
        self
    }

    /// Number of `recognize` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Locales seen by `recognize`, in call order.
    pub fn locales(&self) -> Vec<Option<String>> {
        self.locales.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Recognizer for MockRecognizer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe_unit_count(&self, path: &Path, kind: InputKind) -> Result<usize> {
        match kind {
            InputKind::Document => self
                .page_counts
                .get(path)
                .copied()
                .ok_or_else(|| anyhow!("cannot open document {}", path.display())),
            InputKind::Image | InputKind::Audio => Ok(1),
        }
    }

    async fn recognize(&self, request: &RecognitionRequest) -> Result<Recognized> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut locales) = self.locales.lock() {
            locales.push(request.locale.clone());
        }

        if let Some(delay) = self.delays.get(&request.path) {
            tokio::time::sleep(*delay).await;
        }

        if let Some((path, page)) = &self.failure {
            if *path == request.path && *page == request.page_index {
                bail!("mock failure on page {page}");
            }
        }

        let stem = request
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let text = match self.texts.get(&request.path) {
            Some(text) => text.clone(),
            None => format!("{stem} page {}", request.page_index),
        };

        Ok(Recognized {
            positions: vec![Position {
                text: text.clone(),
                region: Region::Box {
                    x: 0.0,
                    y: 0.0,
                    width: 1.0,
                    height: 1.0,
                },
            }],
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_text_names_file_and_page() {
        let mock = MockRecognizer::new();
        let recognized = mock
            .recognize(&RecognitionRequest {
                path: PathBuf::from("scan.png"),
                kind: InputKind::Image,
                page_index: 1,
                locale: Some("en-US".into()),
            })
            .await
            .unwrap();
        assert_eq!(recognized.text, "scan page 1");
        assert_eq!(mock.calls(), 1);
        assert_eq!(mock.locales(), vec![Some("en-US".to_string())]);
    }

    #[tokio::test]
    async fn unknown_document_fails_probe() {
        let mock = MockRecognizer::new();
        let result = mock
            .probe_unit_count(Path::new("missing.pdf"), InputKind::Document)
            .await;
        assert!(result.is_err());
    }
}
