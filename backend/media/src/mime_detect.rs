//! MIME type detection for input files.
//!
//! The extension decides both the MIME type and which input family a file
//! belongs to; file contents are never sniffed.

use std::path::Path;

use textra_core::InputKind;

/// Detect MIME type by file extension.
pub fn detect_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        // Images
        "jpg" | "jpeg" => "image/jpeg",
        "png"          => "image/png",
        "gif"          => "image/gif",
        "webp"         => "image/webp",
        "bmp"          => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        "heic"         => "image/heic",

        // Audio
        "mp3"          => "audio/mpeg",
        "ogg"          => "audio/ogg",
        "wav"          => "audio/wav",
        "flac"         => "audio/flac",
        "m4a"          => "audio/mp4",
        "opus"         => "audio/opus",
        "aac"          => "audio/aac",
        "aiff"         => "audio/aiff",
        "caf"          => "audio/x-caf",

        // Documents
        "pdf"          => "application/pdf",

        _              => "application/octet-stream",
    }
}

/// Whether a MIME type is for an image.
pub fn is_image(mime: &str) -> bool {
    mime.starts_with("image/")
}

/// Whether a MIME type is for audio.
pub fn is_audio(mime: &str) -> bool {
    mime.starts_with("audio/")
}

/// Whether a MIME type is a paged document.
pub fn is_document(mime: &str) -> bool {
    mime == "application/pdf"
}

/// Input family of a path, or `None` when the extension is not recognized.
pub fn input_kind(path: &Path) -> Option<InputKind> {
    let mime = detect_mime_type(path);
    if is_image(mime) {
        Some(InputKind::Image)
    } else if is_document(mime) {
        Some(InputKind::Document)
    } else if is_audio(mime) {
        Some(InputKind::Audio)
    } else {
        None
    }
}
