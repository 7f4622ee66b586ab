//! Voice hint handling.
//!
//! Callers pass either a full neural voice name (`pt-BR-AntonioNeural`) or a
//! bare locale (`pt-BR`, `pt`). Edge TTS needs a voice name; Google TTS only
//! needs the language.

use sforge_models::request::DEFAULT_VOICE;

const NEURAL_VOICES: &[(&str, &str)] = &[
    ("en", "en-US-GuyNeural"),
    ("pt", "pt-BR-AntonioNeural"),
    ("es", "es-ES-AlvaroNeural"),
    ("fr", "fr-FR-HenriNeural"),
    ("de", "de-DE-ConradNeural"),
    ("it", "it-IT-DiegoNeural"),
];

/// Two-letter language of a voice hint, lowercased.
pub fn language_code(voice: &str) -> String {
    let lang = voice
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    if lang.is_empty() {
        "en".to_string()
    } else {
        lang
    }
}

/// Voice name Edge TTS accepts for a hint.
pub fn edge_voice(voice: &str) -> String {
    let voice = voice.trim();
    if voice.ends_with("Neural") {
        return voice.to_string();
    }
    let lang = language_code(voice);
    NEURAL_VOICES
        .iter()
        .find(|(code, _)| *code == lang)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| DEFAULT_VOICE.to_string())
}
