//! Locale code translation for the recognition backends.
//!
//! Locales arrive as given on the command line (`en-US`, `de`, `zh-Hant`).
//! Tesseract wants its own three-letter codes, speech APIs want ISO 639-1.

/// Primary language subtag, lowercased: `en-US` -> `en`.
pub fn language_subtag(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .next()
        .unwrap_or(locale)
        .to_lowercase()
}

/// Tesseract language code for a locale. Unknown languages fall back to
/// English, which every tesseract install ships with.
pub fn tesseract_language(locale: Option<&str>) -> &'static str {
    let Some(locale) = locale else { return "eng" };
    let lower = locale.to_lowercase();
    match language_subtag(locale).as_str() {
        "de" => "deu",
        "fr" => "fra",
        "es" => "spa",
        "it" => "ita",
        "pt" => "por",
        "nl" => "nld",
        "pl" => "pol",
        "ru" => "rus",
        "uk" => "ukr",
        "tr" => "tur",
        "sv" => "swe",
        "da" => "dan",
        "nb" | "no" => "nor",
        "fi" => "fin",
        "cs" => "ces",
        "el" => "ell",
        "ar" => "ara",
        "he" => "heb",
        "hi" => "hin",
        "ja" => "jpn",
        "ko" => "kor",
        "zh" if lower.contains("hant") || lower.ends_with("-tw") || lower.ends_with("-hk") => {
            "chi_tra"
        }
        "zh" => "chi_sim",
        _ => "eng",
    }
}

/// Two-letter language for speech transcription, if the locale names one.
pub fn speech_language(locale: Option<&str>) -> Option<String> {
    let subtag = language_subtag(locale?);
    (subtag.len() == 2 && subtag.chars().all(|c| c.is_ascii_alphabetic())).then_some(subtag)
}
