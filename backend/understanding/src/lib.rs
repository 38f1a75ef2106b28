//! Concrete recognizers backing the `textra` command: tesseract OCR for
//! images, the PDF text layer for documents, and hosted speech-to-text for
//! audio.

pub mod audio;
pub mod doc_parse;
pub mod locale;
pub mod ocr;

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use async_trait::async_trait;

use textra_core::{InputKind, RecognitionRequest, Recognized, Recognizer};

pub use audio::{AudioProvider, transcribe_audio};
pub use doc_parse::DocParser;
pub use locale::{speech_language, tesseract_language};
pub use ocr::{OcrService, parse_tsv};

/// Routes each unit to the engine for its input kind.
pub struct LocalRecognizer {
    ocr: OcrService,
    docs: DocParser,
    audio: Option<AudioProvider>,
}

impl LocalRecognizer {
    pub fn new(tesseract: impl Into<PathBuf>) -> Self {
        Self {
            ocr: OcrService::new(tesseract),
            docs: DocParser::new(),
            audio: None,
        }
    }

    pub fn with_audio(mut self, provider: AudioProvider) -> Self {
        self.audio = Some(provider);
        self
    }
}

#[async_trait]
impl Recognizer for LocalRecognizer {
    fn name(&self) -> &str {
        "local"
    }

    async fn probe_unit_count(&self, path: &Path, kind: InputKind) -> Result<usize> {
        match kind {
            InputKind::Document => self.docs.page_count(path).await,
            InputKind::Image | InputKind::Audio => Ok(1),
        }
    }

    async fn recognize(&self, request: &RecognitionRequest) -> Result<Recognized> {
        let locale = request.locale.as_deref();
        match request.kind {
            InputKind::Image => self.ocr.extract_text(&request.path, locale).await,
            InputKind::Document => self.docs.page_text(&request.path, request.page_index).await,
            InputKind::Audio => match &self.audio {
                Some(provider) => transcribe_audio(provider, &request.path, locale).await,
                None => bail!("no speech provider configured; set OPENAI_API_KEY or DEEPGRAM_API_KEY"),
            },
        }
    }
}
