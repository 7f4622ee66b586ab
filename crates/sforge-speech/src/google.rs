//! Google Translate TTS engine.
//!
//! The endpoint only accepts short inputs, so text is split into chunks on
//! word boundaries and the MP3 responses are concatenated into one file.

use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use sforge_media::probe_duration;

use crate::engine::{SpeechEngine, SynthesizedAudio};
use crate::error::{SpeechError, SpeechResult};
use crate::voice::language_code;

pub const DEFAULT_BASE_URL: &str = "https://translate.google.com";

/// Longest chunk the endpoint accepts.
pub const MAX_CHUNK_CHARS: usize = 200;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) StoryForge/0.1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct GoogleTtsEngine {
    client: Client,
    base_url: String,
}

impl GoogleTtsEngine {
    pub fn new() -> SpeechResult<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> SpeechResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetch MP3 bytes for `text` in language `lang`.
    pub async fn fetch_audio(&self, text: &str, lang: &str) -> SpeechResult<Vec<u8>> {
        let chunks = split_chunks(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let url = format!("{}/translate_tts", self.base_url);
        let total = chunks.len().to_string();
        let mut audio = Vec::new();

        for (idx, chunk) in chunks.iter().enumerate() {
            debug!(idx, total = chunks.len(), "Fetching TTS chunk");
            let response = self
                .client
                .get(&url)
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", lang),
                    ("q", chunk.as_str()),
                    ("total", total.as_str()),
                    ("idx", idx.to_string().as_str()),
                    ("textlen", chunk.chars().count().to_string().as_str()),
                ])
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(SpeechError::engine_failed(
                    "gtts",
                    format!("chunk {} returned HTTP {}", idx, status),
                ));
            }
            let bytes = response.bytes().await?;
            if bytes.is_empty() {
                return Err(SpeechError::engine_failed(
                    "gtts",
                    format!("chunk {} returned no audio", idx),
                ));
            }
            audio.extend_from_slice(&bytes);
        }

        Ok(audio)
    }
}

#[async_trait]
impl SpeechEngine for GoogleTtsEngine {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        output: &Path,
    ) -> SpeechResult<SynthesizedAudio> {
        let audio = self.fetch_audio(text, &language_code(voice)).await?;
        tokio::fs::write(output, &audio).await?;

        let duration_secs = probe_duration(output).await?;
        Ok(SynthesizedAudio {
            path: output.to_path_buf(),
            duration_secs,
        })
    }

    fn name(&self) -> &'static str {
        "gtts"
    }
}

/// Split on whitespace into chunks of at most `max_chars` characters.
/// Single words longer than that are cut.
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > max_chars {
            if current_len > 0 {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(max_chars);
            chunks.push(word.into_iter().collect());
            word = rest;
        }
        if word.is_empty() {
            continue;
        }

        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current_len += word.len();
        current.extend(word);
    }
    if current_len > 0 {
        chunks.push(current);
    }
    chunks
}
