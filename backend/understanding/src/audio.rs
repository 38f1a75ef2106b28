//! Audio understanding: transcribe audio clips using STT providers.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::info;

use textra_core::{Position, Recognized, Region};
use textra_media::detect_mime_type;

use crate::locale::speech_language;

pub enum AudioProvider {
    Whisper { api_key: String },
    Deepgram { api_key: String },
}

impl AudioProvider {
    pub fn whisper(api_key: impl Into<String>) -> Self {
        Self::Whisper { api_key: api_key.into() }
    }
    pub fn deepgram(api_key: impl Into<String>) -> Self {
        Self::Deepgram { api_key: api_key.into() }
    }
}

/// Transcribe an audio file to text with timed segments.
pub async fn transcribe_audio(
    provider: &AudioProvider,
    path: &Path,
    locale: Option<&str>,
) -> Result<Recognized> {
    let audio = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mime = detect_mime_type(path);
    let language = speech_language(locale);
    match provider {
        AudioProvider::Whisper { api_key } => {
            transcribe_whisper(api_key, path, audio, mime, language).await
        }
        AudioProvider::Deepgram { api_key } => {
            transcribe_deepgram(api_key, audio, mime, language).await
        }
    }
}

#[derive(Debug, Deserialize)]
struct WhisperVerbose {
    text: String,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}

async fn transcribe_whisper(
    api_key: &str,
    path: &Path,
    audio: Vec<u8>,
    mime: &str,
    language: Option<String>,
) -> Result<Recognized> {
    info!(path = %path.display(), "[Audio] Transcribing via OpenAI Whisper");
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string());
    let part = reqwest::multipart::Part::bytes(audio)
        .file_name(file_name)
        .mime_str(mime)?;
    let mut form = reqwest::multipart::Form::new()
        .text("model", "whisper-1")
        .text("response_format", "verbose_json")
        .part("file", part);
    if let Some(language) = language {
        form = form.text("language", language);
    }
    let client = reqwest::Client::new();
    let resp = client
        .post("https://api.openai.com/v1/audio/transcriptions")
        .bearer_auth(api_key)
        .multipart(form)
        .send()
        .await?;
    if !resp.status().is_success() {
        bail!("Whisper error: {}", resp.text().await.unwrap_or_default());
    }
    let body: WhisperVerbose = resp.json().await?;
    Ok(from_whisper(body))
}

fn from_whisper(body: WhisperVerbose) -> Recognized {
    let positions = body
        .segments
        .into_iter()
        .map(|s| Position {
            text: s.text.trim().to_string(),
            region: Region::Span {
                start: s.start,
                end: s.end,
            },
        })
        .collect();
    Recognized {
        text: body.text.trim().to_string(),
        positions,
    }
}

async fn transcribe_deepgram(
    api_key: &str,
    audio: Vec<u8>,
    mime: &str,
    language: Option<String>,
) -> Result<Recognized> {
    info!("[Audio] Transcribing via Deepgram");
    let mut url = "https://api.deepgram.com/v1/listen?model=nova-2&punctuate=true".to_string();
    if let Some(language) = language {
        url.push_str(&format!("&language={language}"));
    }
    let client = reqwest::Client::new();
    let resp = client
        .post(url)
        .header("Authorization", format!("Token {}", api_key))
        .header("Content-Type", mime)
        .body(audio)
        .send()
        .await?;
    if !resp.status().is_success() {
        bail!("Deepgram error: {}", resp.text().await.unwrap_or_default());
    }
    let json: serde_json::Value = resp.json().await?;
    Ok(from_deepgram(&json))
}

fn from_deepgram(json: &serde_json::Value) -> Recognized {
    let alternative = &json["results"]["channels"][0]["alternatives"][0];
    let positions = alternative["words"]
        .as_array()
        .map(|words| {
            words
                .iter()
                .filter_map(|w| {
                    let text = w["punctuated_word"].as_str().or_else(|| w["word"].as_str())?;
                    Some(Position {
                        text: text.to_string(),
                        region: Region::Span {
                            start: w["start"].as_f64()?,
                            end: w["end"].as_f64()?,
                        },
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    Recognized {
        text: alternative["transcript"].as_str().unwrap_or("").to_string(),
        positions,
    }
}
