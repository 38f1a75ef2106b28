//! Document Parsing
//!
//! Opens PDFs with `lopdf` to count pages and read the embedded text layer
//! of individual pages.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow, bail};
use lopdf::Document;
use tracing::{debug, info};

use textra_core::Recognized;

/// Loads each PDF once and serves page counts and page text from it.
#[derive(Default)]
pub struct DocParser {
    documents: Mutex<HashMap<PathBuf, Arc<Document>>>,
}

impl DocParser {
    pub fn new() -> Self {
        Self::default()
    }

    async fn load(&self, path: &Path) -> Result<Arc<Document>> {
        if let Some(doc) = self.cached(path) {
            return Ok(doc);
        }

        info!(path = %path.display(), "Parsing PDF document");
        let owned = path.to_path_buf();
        let doc = tokio::task::spawn_blocking(move || Document::load(&owned))
            .await
            .context("PDF loader task failed")?
            .with_context(|| format!("failed to load PDF {}", path.display()))?;
        if doc.is_encrypted() {
            bail!("{} is encrypted", path.display());
        }

        let doc = Arc::new(doc);
        if let Ok(mut documents) = self.documents.lock() {
            documents.insert(path.to_path_buf(), Arc::clone(&doc));
        }
        Ok(doc)
    }

    fn cached(&self, path: &Path) -> Option<Arc<Document>> {
        self.documents.lock().ok()?.get(path).cloned()
    }

    pub async fn page_count(&self, path: &Path) -> Result<usize> {
        let doc = self.load(path).await?;
        Ok(doc.get_pages().len())
    }

    /// Text layer of one 1-based page. Scanned pages without a text layer
    /// come back empty.
    pub async fn page_text(&self, path: &Path, page_index: usize) -> Result<Recognized> {
        let doc = self.load(path).await?;
        let page_number = u32::try_from(page_index)?;
        if !doc.get_pages().contains_key(&page_number) {
            return Err(anyhow!(
                "{} has no page {page_index}",
                path.display()
            ));
        }

        let text = tokio::task::spawn_blocking(move || doc.extract_text(&[page_number]))
            .await
            .context("PDF text task failed")?
            .with_context(|| format!("failed to read text of page {page_index}"))?;
        debug!(path = %path.display(), page = page_index, chars = text.len(), "Extracted page text");

        Ok(Recognized {
            text: text.trim_end().to_string(),
            positions: Vec::new(),
        })
    }
}
